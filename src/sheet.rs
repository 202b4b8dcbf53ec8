// src/sheet.rs
//! Spreadsheet reader: pulls the comments column out of an exported course
//! sheet at a fixed row stride. Supports workbooks (xlsx/xlsm/xlsb/xls/ods)
//! and CSV exports; CSV files have a single implicit sheet.

use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::normalize::RawComment;

/// Where the comments live. Row numbers count data rows, header excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub sheet: String,
    pub column: String,
    /// First data row holding a comment.
    pub offset: usize,
    /// Distance between consecutive comment rows.
    pub stride: usize,
    /// Number of records; `None` reads until the sheet ends.
    pub count: Option<usize>,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sheet: "Opiniones".to_string(),
            column: "OPINIONES".to_string(),
            offset: 2,
            stride: 3,
            count: Some(788),
        }
    }
}

impl SheetLayout {
    /// Data-row positions to read, validated against the rows available.
    pub fn positions(&self, available: usize) -> Result<Vec<usize>> {
        let stride = self.stride.max(1);
        match self.count {
            Some(0) => Ok(Vec::new()),
            Some(n) => {
                let last = self.offset + stride * (n - 1);
                if last >= available {
                    return Err(PipelineError::Input(format!(
                        "sheet has {available} data rows but layout needs row {last} \
                         ({n} records, offset {}, stride {stride})",
                        self.offset
                    )));
                }
                Ok((0..n).map(|k| self.offset + stride * k).collect())
            }
            None => Ok((self.offset..available).step_by(stride).collect()),
        }
    }
}

/// Read the raw comments in sheet order.
pub fn read_comments(path: &Path, layout: &SheetLayout) -> Result<Vec<RawComment>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let column = match ext.as_str() {
        "csv" => read_csv_column(path, &layout.column)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook_column(path, layout)?,
        other => {
            return Err(PipelineError::Input(format!(
                "unsupported data file type {other:?}: {}",
                path.display()
            )))
        }
    };

    let positions = layout.positions(column.len())?;
    tracing::debug!(
        file = %path.display(),
        rows = column.len(),
        picked = positions.len(),
        "sheet column read"
    );
    Ok(positions.into_iter().map(|i| column[i].clone()).collect())
}

fn read_workbook_column(path: &Path, layout: &SheetLayout) -> Result<Vec<RawComment>> {
    let mut wb = open_workbook_auto(path)
        .map_err(|e| PipelineError::Input(format!("opening {}: {e}", path.display())))?;
    let range = wb
        .worksheet_range(&layout.sheet)
        .map_err(|e| PipelineError::Input(format!("sheet {:?}: {e}", layout.sheet)))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| PipelineError::Input(format!("sheet {:?} is empty", layout.sheet)))?;
    let col = header
        .iter()
        .position(|c| cell_text(c).is_some_and(|s| s.trim() == layout.column))
        .ok_or_else(|| missing_column(&layout.column))?;

    Ok(rows.map(|r| r.get(col).and_then(cell_text)).collect())
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn read_csv_column(path: &Path, column: &str) -> Result<Vec<RawComment>> {
    let data = fs::read(path)
        .map_err(|e| PipelineError::Input(format!("opening {}: {e}", path.display())))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_slice());
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Input(format!("reading CSV header: {e}")))?
        .clone();
    let col = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| missing_column(column))?;

    let mut rec = csv::StringRecord::new();
    let mut out = Vec::new();
    loop {
        let start = rdr.position().byte() as usize;
        let more = rdr
            .read_record(&mut rec)
            .map_err(|e| PipelineError::Input(format!("CSV data row {}: {e}", out.len())))?;
        if !more {
            break;
        }
        // the reader drops blank lines, but each one is still a sheet row
        out.extend(std::iter::repeat(None).take(blank_lines_at(&data, start)));
        out.push(
            rec.get(col)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }
    Ok(out)
}

/// Empty lines between byte `at` (where the previous record stopped) and the
/// next record. `\r\n`, `\r` and `\n` each end one line.
fn blank_lines_at(data: &[u8], mut at: usize) -> usize {
    // tail of a CRLF that closed the previous record
    if at > 0 && data[at - 1] == b'\r' && data.get(at) == Some(&b'\n') {
        at += 1;
    }
    let mut blank = 0;
    while let Some(&b) = data.get(at) {
        match b {
            b'\r' if data.get(at + 1) == Some(&b'\n') => at += 2,
            b'\r' | b'\n' => at += 1,
            _ => break,
        }
        blank += 1;
    }
    blank
}

fn missing_column(column: &str) -> PipelineError {
    PipelineError::Input(format!("column {column:?} not found in header"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_positions() {
        let layout = SheetLayout::default();
        let p = layout.positions(2 + 3 * 787 + 1).unwrap();
        assert_eq!(p.len(), 788);
        assert_eq!(p[0], 2);
        assert_eq!(p[1], 5);
        assert_eq!(p[787], 2 + 3 * 787);
    }

    #[test]
    fn too_few_rows_is_input_error() {
        let layout = SheetLayout::default();
        assert!(matches!(
            layout.positions(100),
            Err(PipelineError::Input(_))
        ));
    }

    #[test]
    fn blank_line_counting() {
        assert_eq!(blank_lines_at(b"r1\n", 0), 0);
        assert_eq!(blank_lines_at(b"\n\nr1", 0), 2);
        assert_eq!(blank_lines_at(b"r0\r\n\r\nr2", 3), 1);
        assert_eq!(blank_lines_at(b"r0\r\n\r\nr2", 4), 1);
        assert_eq!(blank_lines_at(b"\n\n", 0), 2);
    }

    #[test]
    fn open_ended_count_reads_to_end() {
        let layout = SheetLayout {
            offset: 1,
            stride: 2,
            count: None,
            ..Default::default()
        };
        assert_eq!(layout.positions(6).unwrap(), vec![1, 3, 5]);
        assert!(layout.positions(0).unwrap().is_empty());
    }
}
