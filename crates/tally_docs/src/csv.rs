//! Delimited-text rendering.
//!
//! Values are never quoted. Any delimiter (or line break) inside a value is
//! replaced by a single space, so every rendered line splits back into exactly
//! one field per column.

use tracing::debug;

use crate::error::{ExportError, Result};
use crate::model::{CellValue, Row, Sheet};

/// Render rows as comma-separated text.
///
/// With non-empty `headers` the first line holds the header keys. Lines are
/// joined with `\n` and there is no trailing newline.
pub fn render_delimited(rows: &[Row], headers: &[String]) -> Result<String> {
    generate_delimited(rows, headers, ',')
}

/// Render rows with a custom single-character delimiter (e.g. `'\t'` for TSV).
pub fn render_delimited_with(rows: &[Row], headers: &[String], delimiter: char) -> Result<String> {
    validate_delimiter(delimiter)?;
    generate_delimited(rows, headers, delimiter)
}

/// Render a whole sheet. The sheet name is not part of the output.
pub fn render_sheet_delimited(sheet: &Sheet, delimiter: char) -> Result<String> {
    render_delimited_with(&sheet.rows, &sheet.headers, delimiter)
}

/// Reject delimiters that cannot round-trip through a line-oriented format.
pub fn validate_delimiter(delimiter: char) -> Result<()> {
    if !delimiter.is_ascii() || matches!(delimiter, '\n' | '\r' | ' ' | '"') {
        return Err(ExportError::MalformedModel(format!(
            "Unusable delimiter {delimiter:?}"
        )));
    }
    Ok(())
}

fn generate_delimited(rows: &[Row], headers: &[String], delimiter: char) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    if !headers.is_empty() {
        let header_cells: Vec<String> = headers.iter().map(|h| sanitize(h, delimiter)).collect();
        write_line(&mut writer, &header_cells, delimiter as u8).map_err(|e| ExportError::render("header line", e))?;
    }

    // Without headers each row falls back to its raw values in insertion order.
    for (idx, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .cells(headers)
            .into_iter()
            .map(|cell| sanitize(&cell.to_text(), delimiter))
            .collect();
        write_line(&mut writer, &cells, delimiter as u8)
            .map_err(|e| ExportError::render(format!("row {}", idx + 1), e))?;
    }

    let mut bytes = writer
        .into_inner()
        .map_err(|e| ExportError::render("delimited text", e.error()))?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }

    let text = String::from_utf8(bytes).map_err(|e| ExportError::render("delimited text", e))?;
    debug!(
        rows = rows.len(),
        columns = headers.len(),
        bytes = text.len(),
        "rendered delimited text"
    );
    Ok(text)
}

/// Write one record. A record with no content is written by hand, since the
/// csv writer would otherwise emit `""` for it.
fn write_line(
    writer: &mut csv::Writer<Vec<u8>>,
    cells: &[String],
    delimiter: u8,
) -> std::io::Result<()> {
    if cells.iter().all(String::is_empty) {
        writer.flush()?;
        let out = writer.get_mut();
        out.extend(std::iter::repeat_n(delimiter, cells.len().saturating_sub(1)));
        out.push(b'\n');
        return Ok(());
    }
    writer.write_record(cells).map_err(std::io::Error::from)
}

fn sanitize(value: &str, delimiter: char) -> String {
    value
        .chars()
        .map(|c| if c == delimiter || c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Parse delimited text produced by [`render_delimited_with`] back into a sheet.
///
/// The first line is the header row. Fields are read verbatim (no quote
/// handling) as string cells; empty fields become `Null`. Blank lines are
/// skipped.
pub fn parse_delimited(input: &str, delimiter: char) -> Result<Sheet> {
    validate_delimiter(delimiter)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter as u8)
        .quoting(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ExportError::MalformedModel(format!("Failed to read header line: {e}")))?
        .iter()
        .map(String::from)
        .collect();

    let mut sheet = Sheet {
        name: None,
        headers,
        rows: Vec::new(),
    };

    for (idx, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| ExportError::MalformedModel(format!("Failed to read line {}: {e}", idx + 2)))?;
        let row: Row = sheet
            .headers
            .iter()
            .zip(record.iter())
            .map(|(key, field)| {
                let value = if field.is_empty() {
                    CellValue::Null
                } else {
                    CellValue::String(field.to_string())
                };
                (key.clone(), value)
            })
            .collect();
        sheet.rows.push(row);
    }

    Ok(sheet)
}
