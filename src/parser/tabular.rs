//! Parsers for tabular formats: CSV and Excel workbooks.

use calamine::{open_workbook_auto, Reader};
use std::fmt::Write as _;
use std::path::Path;

use super::MAX_SAMPLE_ROWS;
use crate::error::ApiError;

/// CSV: header row plus up to 50 sampled data rows.
///
/// Values are split on bare commas with surrounding double quotes stripped;
/// quoted commas are not interpreted. That matches the descriptive,
/// non-round-trippable contract of this parser.
pub async fn parse_csv(path: &Path) -> Result<String, ApiError> {
    let content = tokio::fs::read_to_string(path).await?;

    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return Ok("Empty CSV file".to_string());
    }

    let headers = split_row(lines[0]);
    let sample_end = lines.len().min(MAX_SAMPLE_ROWS + 1);
    let data_rows = &lines[1..sample_end];

    let mut result = format!(
        "CSV File with {} rows and {} columns.\n\n",
        lines.len() - 1,
        headers.len()
    );
    let _ = writeln!(result, "Columns: {}\n", headers.join(", "));
    let _ = writeln!(result, "Sample data (first {} rows):", data_rows.len());
    for (index, row) in data_rows.iter().enumerate() {
        let values = split_row(row);
        let _ = writeln!(result, "Row {}: {}", index + 1, values.join(" | "));
    }

    Ok(result)
}

/// Excel: per-sheet row counts, headers, and up to 50 sampled rows, sheets
/// concatenated in workbook order.
pub async fn parse_excel(path: &Path) -> Result<String, ApiError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || parse_excel_blocking(&path))
        .await
        .map_err(|e| ApiError::Parse(format!("Excel parse task failed: {e}")))?
}

fn parse_excel_blocking(path: &Path) -> Result<String, ApiError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ApiError::Parse(format!("failed to open workbook: {e}")))?;

    let sheets = workbook.worksheets();
    let mut result = format!("Excel file with {} sheet(s).\n\n", sheets.len());

    for (name, range) in sheets {
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        let _ = writeln!(result, "Sheet: {name}");
        let _ = writeln!(result, "Rows: {}", rows.len());

        if let Some(headers) = rows.first() {
            let _ = writeln!(result, "Columns: {}\n", headers.join(", "));

            let sample_end = rows.len().min(MAX_SAMPLE_ROWS + 1);
            let sample = &rows[1..sample_end];
            let _ = writeln!(result, "Sample data (first {} rows):", sample.len());
            for (index, row) in sample.iter().enumerate() {
                let _ = writeln!(result, "Row {}: {}", index + 1, row.join(" | "));
            }
        }
        result.push('\n');
    }

    Ok(result)
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|v| {
            let v = v.trim();
            let v = v.strip_prefix('"').unwrap_or(v);
            let v = v.strip_suffix('"').unwrap_or(v);
            v.to_string()
        })
        .collect()
}
