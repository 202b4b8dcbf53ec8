// src/report/mod.rs
//! Report assembly: bar chart (SVG), narrative report (PDF, plus a Markdown
//! copy) and a JSON summary, all written into the configured output directory.

pub mod pdf;

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classify::{Category, CategoryCounts, Examples};
use crate::error::{PipelineError, Result};
use crate::pipeline::GradeReport;

/// Bar colors for Mala / Regular / Buena.
const COLORS: [&str; 3] = ["#FC540B", "#FCCD0B", "#35D773"];

const CHART_W: u32 = 640;
const CHART_H: u32 = 480;

/// What the renderer needs besides the graded batch.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub course: &'a str,
    /// `YYYY-MM-DD`
    pub date: String,
    pub author: &'a str,
    pub report: &'a GradeReport,
}

impl<'a> ReportContext<'a> {
    pub fn today(course: &'a str, author: &'a str, report: &'a GradeReport) -> Self {
        Self {
            course,
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            author,
            report,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifacts {
    pub chart: PathBuf,
    pub pdf: PathBuf,
    pub narrative: PathBuf,
    pub summary: PathBuf,
}

pub trait ReportRenderer {
    fn render(&self, ctx: &ReportContext<'_>) -> Result<ReportArtifacts>;
}

/// Writes `<chart_file>` and `Reporte del curso <course>` as `.pdf`, `.md`
/// and `.json`.
#[derive(Debug, Clone)]
pub struct FileReportRenderer {
    pub out_dir: PathBuf,
    pub chart_file: String,
}

impl FileReportRenderer {
    pub fn new(out_dir: impl Into<PathBuf>, chart_file: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            chart_file: chart_file.into(),
        }
    }
}

impl ReportRenderer for FileReportRenderer {
    fn render(&self, ctx: &ReportContext<'_>) -> Result<ReportArtifacts> {
        fs::create_dir_all(&self.out_dir)?;
        let stem = format!("Reporte del curso {}", file_safe(ctx.course));

        let chart = self.out_dir.join(&self.chart_file);
        let pdf = self.out_dir.join(format!("{stem}.pdf"));
        let narrative = self.out_dir.join(format!("{stem}.md"));
        let summary = self.out_dir.join(format!("{stem}.json"));

        write_file(&chart, &render_chart_svg(ctx.course, &ctx.report.aggregate.counts))?;
        write_file(&pdf, pdf::render_pdf(ctx)?)?;
        write_file(&narrative, render_narrative(ctx, &self.chart_file))?;
        let json = serde_json::to_string_pretty(&Summary::from_ctx(ctx))
            .map_err(|e| PipelineError::Report(format!("serializing summary: {e}")))?;
        write_file(&summary, &json)?;

        tracing::info!(
            chart = %chart.display(),
            pdf = %pdf.display(),
            "report written"
        );
        Ok(ReportArtifacts {
            chart,
            pdf,
            narrative,
            summary,
        })
    }
}

fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    fs::write(path, content)
        .map_err(|e| PipelineError::Report(format!("writing {}: {e}", path.display())))
}

/// Course names end up in file names; keep them on one path component.
fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "sin nombre".to_string()
    } else {
        cleaned
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Count plot with one bar per category and the count above each bar.
pub fn render_chart_svg(course: &str, counts: &CategoryCounts) -> String {
    let (left, right, top, bottom) = (70.0, 30.0, 70.0, 60.0);
    let plot_w = CHART_W as f64 - left - right;
    let plot_h = CHART_H as f64 - top - bottom;
    let max = Category::ALL
        .iter()
        .map(|&c| counts.get(c))
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let slot = plot_w / 3.0;
    let bar_w = slot * 0.8;
    let base_y = top + plot_h;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CHART_W}" height="{CHART_H}" viewBox="0 0 {CHART_W} {CHART_H}" font-family="Arial, Helvetica, sans-serif">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="35" text-anchor="middle" font-size="16" font-weight="bold">Comportamiento de las opiniones del curso "{}"</text>"#,
        CHART_W / 2,
        xml_escape(course)
    );

    // Horizontal grid + y ticks
    for i in 0..=4 {
        let v = max * i as f64 / 4.0;
        let y = base_y - plot_h * i as f64 / 4.0;
        let _ = writeln!(
            svg,
            r##"<line x1="{left}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#DDDDDD"/>"##,
            left + plot_w
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{}</text>"#,
            left - 6.0,
            y + 4.0,
            v.round() as u64
        );
    }

    for (i, &cat) in Category::ALL.iter().enumerate() {
        let n = counts.get(cat);
        let h = plot_h * n as f64 / max;
        let x = left + slot * i as f64 + (slot - bar_w) / 2.0;
        let cx = x + bar_w / 2.0;
        let _ = writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{:.1}" width="{bar_w:.1}" height="{h:.1}" fill="{}"/>"#,
            base_y - h,
            COLORS[i]
        );
        let _ = writeln!(
            svg,
            r#"<text x="{cx:.1}" y="{:.1}" text-anchor="middle" font-size="12">{n}</text>"#,
            base_y - h - 6.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="{cx:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
            base_y + 18.0,
            cat.label_es()
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{}" text-anchor="middle" font-size="13" font-weight="bold">Clasificación</text>"#,
        left + plot_w / 2.0,
        CHART_H - 15
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{:.1}" text-anchor="middle" font-size="13" font-weight="bold" transform="rotate(-90 20 {:.1})">Frecuencia</text>"#,
        top + plot_h / 2.0,
        top + plot_h / 2.0
    );
    svg.push_str("</svg>\n");
    svg
}

pub fn render_narrative(ctx: &ReportContext<'_>, chart_file: &str) -> String {
    let agg = &ctx.report.aggregate;
    let mut md = String::new();

    let _ = writeln!(md, "**Fecha del Informe:** {}  ", ctx.date);
    if !ctx.author.trim().is_empty() {
        let _ = writeln!(md, "**Autor:** {}  ", ctx.author.trim());
    }
    let _ = writeln!(md);
    let _ = writeln!(
        md,
        "# Informe de Análisis de Sentimientos para el Curso {}\n",
        ctx.course
    );
    let _ = writeln!(md, "![Comportamiento de las opiniones]({chart_file})\n");
    let _ = writeln!(
        md,
        "La siguiente gráfica nos muestra la cantidad de opiniones malas, regulares y buenas. \
         En este caso tenemos {} opiniones en total, de las cuales {} son buenas, {} son \
         regulares y {} son malas.\n",
        agg.total, agg.counts.good, agg.counts.regular, agg.counts.bad
    );
    let _ = writeln!(
        md,
        "Si tuviéramos que calificar el curso de 0 a 5 estrellas, el puntaje sería de: \
         {:.2} estrellas.\n",
        agg.star_score
    );

    let _ = writeln!(md, "## Ejemplos de Comentarios\n");
    let _ = writeln!(md, "- **Comentario Bueno:** {}", agg.examples.good.trim());
    let _ = writeln!(md, "- **Comentario Neutro:** {}", agg.examples.regular.trim());
    let _ = writeln!(md, "- **Comentario Malo:** {}", agg.examples.bad.trim());

    let failed = &ctx.report.failed;
    if !failed.is_empty() {
        let _ = writeln!(md, "\n## Comentarios sin traducir\n");
        let _ = writeln!(
            md,
            "{} comentario(s) no pudieron traducirse y quedaron fuera de la calificación:\n",
            failed.len()
        );
        for f in failed {
            let _ = writeln!(md, "- #{} ({} intento(s)): {}", f.index, f.attempts, f.error);
        }
    }
    md
}

#[derive(Debug, Serialize)]
struct FailedRow<'a> {
    index: usize,
    attempts: u32,
    error: String,
    original: &'a str,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    course: &'a str,
    date: &'a str,
    read: usize,
    filtered: usize,
    total: usize,
    counts: CategoryCounts,
    ratios: [(Category, f64); 3],
    star_score: f64,
    examples: &'a Examples,
    failed: Vec<FailedRow<'a>>,
}

impl<'a> Summary<'a> {
    fn from_ctx(ctx: &'a ReportContext<'a>) -> Self {
        let r = ctx.report;
        let agg = &r.aggregate;
        Self {
            course: ctx.course,
            date: &ctx.date,
            read: r.read,
            filtered: r.filtered,
            total: agg.total,
            counts: agg.counts,
            ratios: Category::ALL.map(|c| (c, agg.ratio(c))),
            star_score: agg.star_score,
            examples: &agg.examples,
            failed: r
                .failed
                .iter()
                .map(|f| FailedRow {
                    index: f.index,
                    attempts: f.attempts,
                    error: f.error.to_string(),
                    original: &f.original,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AggregateResult;

    fn sample() -> GradeReport {
        GradeReport {
            aggregate: AggregateResult {
                counts: CategoryCounts {
                    bad: 2,
                    regular: 3,
                    good: 5,
                },
                total: 10,
                star_score: 3.6,
                examples: Examples {
                    good: "Excelente".into(),
                    regular: "Normal".into(),
                    bad: "Aburrido".into(),
                },
            },
            scored: vec![],
            failed: vec![],
            filtered: 1,
            read: 11,
        }
    }

    #[test]
    fn chart_has_three_bars_and_escaped_title() {
        let svg = render_chart_svg("Higiene <Manos>", &sample().aggregate.counts);
        assert_eq!(svg.matches("<rect x=").count(), 3);
        assert!(svg.contains("Higiene &lt;Manos&gt;"));
        for c in COLORS {
            assert!(svg.contains(c));
        }
        assert!(svg.contains(">Buena<"));
    }

    #[test]
    fn narrative_mentions_counts_and_examples() {
        let r = sample();
        let ctx = ReportContext {
            course: "Higiene de Manos",
            date: "2026-01-02".into(),
            author: "",
            report: &r,
        };
        let md = render_narrative(&ctx, "Opiniones.svg");
        assert!(md.contains("tenemos 10 opiniones en total, de las cuales 5 son buenas"));
        assert!(md.contains("3.60 estrellas"));
        assert!(md.contains("**Comentario Neutro:** Normal"));
        assert!(!md.contains("**Autor:**"));
        assert!(!md.contains("sin traducir"));
    }

    #[test]
    fn renderer_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let r = sample();
        let ctx = ReportContext::today("Curso/Prueba", "Equipo", &r);
        let out = FileReportRenderer::new(dir.path(), "Opiniones.svg")
            .render(&ctx)
            .unwrap();
        assert!(out.chart.exists());
        assert!(out.pdf.ends_with("Reporte del curso Curso_Prueba.pdf"));
        assert!(fs::read(&out.pdf).unwrap().starts_with(b"%PDF-"));
        assert!(out.narrative.ends_with("Reporte del curso Curso_Prueba.md"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out.summary).unwrap()).unwrap();
        assert_eq!(json["total"], 10);
        assert_eq!(json["counts"]["good"], 5);
        assert_eq!(json["star_score"], 3.6);
    }
}
