// src/report/pdf.rs
//! Narrative report as an A4 PDF: header, the category bar chart drawn with
//! vector shapes, the star grade, example comments and untranslated ones.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rect, Rgb,
};

use super::{ReportContext, COLORS};
use crate::classify::Category;
use crate::error::{PipelineError, Result};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const BODY_PT: f32 = 11.0;
const CHART_BOX_H: f32 = 85.0;

/// Points to millimetres.
const PT_MM: f32 = 0.3528;

pub fn render_pdf(ctx: &ReportContext<'_>) -> Result<Vec<u8>> {
    let page = layout(ctx)?;
    tracing::debug!(pages = page.pages, "pdf laid out");
    page.doc.save_to_bytes().map_err(pdf_err)
}

/// Lays the report out page by page, top to bottom.
fn layout(ctx: &ReportContext<'_>) -> Result<Page> {
    let agg = &ctx.report.aggregate;
    let mut p = Page::new(&format!("Reporte del curso {}", ctx.course))?;

    p.text(&format!("Fecha del Informe: {}", ctx.date), BODY_PT, true);
    if !ctx.author.trim().is_empty() {
        p.text(&format!("Autor: {}", ctx.author.trim()), BODY_PT, true);
    }
    p.gap(4.0);
    p.paragraph(
        &format!(
            "Informe de Análisis de Sentimientos para el Curso {}",
            ctx.course
        ),
        16.0,
        true,
    );
    p.gap(3.0);

    p.chart(ctx.course, |c| agg.counts.get(c));

    p.paragraph(
        &format!(
            "La siguiente gráfica nos muestra la cantidad de opiniones malas, regulares y \
             buenas. En este caso tenemos {} opiniones en total, de las cuales {} son buenas, \
             {} son regulares y {} son malas.",
            agg.total, agg.counts.good, agg.counts.regular, agg.counts.bad
        ),
        BODY_PT,
        false,
    );
    p.gap(2.0);
    p.paragraph(
        &format!(
            "Si tuviéramos que calificar el curso de 0 a 5 estrellas, el puntaje sería de: \
             {:.2} estrellas.",
            agg.star_score
        ),
        BODY_PT,
        false,
    );

    p.gap(5.0);
    p.paragraph("Ejemplos de Comentarios", 13.0, true);
    p.gap(1.0);
    for (label, text) in [
        ("Comentario Bueno", &agg.examples.good),
        ("Comentario Neutro", &agg.examples.regular),
        ("Comentario Malo", &agg.examples.bad),
    ] {
        p.paragraph(&format!("{label}: {}", text.trim()), BODY_PT, false);
        p.gap(1.0);
    }

    let failed = &ctx.report.failed;
    if !failed.is_empty() {
        p.gap(4.0);
        p.paragraph("Comentarios sin traducir", 13.0, true);
        p.paragraph(
            &format!(
                "{} comentario(s) no pudieron traducirse y quedaron fuera de la calificación:",
                failed.len()
            ),
            BODY_PT,
            false,
        );
        for f in failed {
            p.paragraph(
                &format!("#{} ({} intento(s)): {}", f.index, f.attempts, f.error),
                BODY_PT,
                false,
            );
        }
    }
    Ok(p)
}

/// Cursor over the document; starts a new page when the next block does not fit.
struct Page {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next line, from the page bottom.
    y: f32,
    pages: usize,
}

impl Page {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "report");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_H - MARGIN,
            pages: 1,
        })
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "report");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_H - MARGIN;
        self.pages += 1;
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn text(&mut self, text: &str, size: f32, bold: bool) {
        let line_h = size * PT_MM * 1.4;
        self.ensure(line_h);
        self.y -= line_h;
        self.put(text, size, bold, MARGIN, self.y);
    }

    fn paragraph(&mut self, text: &str, size: f32, bold: bool) {
        let max = max_chars(PAGE_W - 2.0 * MARGIN, size);
        for line in wrap(text, max) {
            self.text(&line, size, bold);
        }
    }

    fn put(&self, text: &str, size: f32, bold: bool, x: f32, y: f32) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(black());
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    fn put_centered(&self, text: &str, size: f32, bold: bool, cx: f32, y: f32) {
        self.put(text, size, bold, cx - text_width(text, size) / 2.0, y);
    }

    /// Same plot as the SVG chart: one bar per category, count on top.
    fn chart(&mut self, course: &str, count: impl Fn(Category) -> usize) {
        self.ensure(CHART_BOX_H);
        let top = self.y;
        let width = PAGE_W - 2.0 * MARGIN;
        let cx = MARGIN + width / 2.0;

        self.put_centered(
            &format!("Comportamiento de las opiniones del curso \"{course}\""),
            12.0,
            true,
            cx,
            top - 6.0,
        );

        let (plot_left, plot_bottom) = (MARGIN + 10.0, top - CHART_BOX_H + 14.0);
        let plot_w = width - 20.0;
        let plot_h = CHART_BOX_H - 30.0;
        let max = Category::ALL
            .iter()
            .map(|&c| count(c))
            .max()
            .unwrap_or(0)
            .max(1) as f32;
        let slot = plot_w / 3.0;
        let bar_w = slot * 0.6;

        for (i, &cat) in Category::ALL.iter().enumerate() {
            let n = count(cat);
            let h = plot_h * n as f32 / max;
            let x = plot_left + slot * i as f32 + (slot - bar_w) / 2.0;
            self.layer.set_fill_color(hex_color(COLORS[i]));
            self.layer
                .add_rect(Rect::new(Mm(x), Mm(plot_bottom), Mm(x + bar_w), Mm(plot_bottom + h)));
            let bar_cx = x + bar_w / 2.0;
            self.put_centered(&n.to_string(), 10.0, false, bar_cx, plot_bottom + h + 2.0);
            self.put_centered(cat.label_es(), 10.0, false, bar_cx, plot_bottom - 6.0);
        }
        self.put_centered("Clasificación", 10.0, true, cx, plot_bottom - 12.0);
        self.y = top - CHART_BOX_H;
    }
}

fn pdf_err(e: printpdf::Error) -> PipelineError {
    PipelineError::Report(format!("building pdf: {e}"))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

/// `#RRGGBB` to a fill color; anything unparsable draws black.
fn hex_color(hex: &str) -> Color {
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map_or(0.0, |v| v as f32 / 255.0)
    };
    Color::Rgb(Rgb::new(channel(1), channel(3), channel(5), None))
}

/// Helvetica averages about half an em per glyph.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * PT_MM
}

fn max_chars(width: f32, size: f32) -> usize {
    ((width / (size * 0.5 * PT_MM)) as usize).max(10)
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, max: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max {
            if !cur.is_empty() {
                lines.push(std::mem::take(&mut cur));
            }
            let head: String = word.chars().take(max).collect();
            word = word.chars().skip(max).collect();
            lines.push(head);
        }
        let needed = cur.chars().count() + usize::from(!cur.is_empty()) + word.chars().count();
        if needed > max && !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(&word);
    }
    if !cur.is_empty() || lines.is_empty() {
        lines.push(cur);
    }
    lines
}
