use std::collections::HashSet;

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};
use tracing::{debug, warn};

use crate::error::{ExportError, Result};
use crate::model::{format_number, CellValue, Sheet};

/// Longest sheet name the container accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters the container forbids in a sheet name.
const FORBIDDEN_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Names Excel reserves for itself.
const RESERVED_NAMES: &[&str] = &["history"];

/// Workbook rendering switches.
#[derive(Debug, Clone, Copy)]
pub struct XlsxOptions {
    pub bold_headers: bool,
    pub autofit_columns: bool,
}

impl Default for XlsxOptions {
    fn default() -> Self {
        Self {
            bold_headers: true,
            autofit_columns: true,
        }
    }
}

/// Generate a workbook with a single tab.
pub fn render_sheet(sheet: &Sheet) -> Result<Vec<u8>> {
    render_workbook(std::slice::from_ref(sheet))
}

/// Generate a workbook with one tab per sheet, in input order.
///
/// Returns the raw bytes of the xlsx file (can be written to disk or sent as download).
pub fn render_workbook(sheets: &[Sheet]) -> Result<Vec<u8>> {
    render_workbook_with(sheets, &XlsxOptions::default())
}

pub fn render_workbook_with(sheets: &[Sheet], options: &XlsxOptions) -> Result<Vec<u8>> {
    if sheets.is_empty() {
        return Err(ExportError::MalformedModel(
            "A workbook needs at least one sheet".into(),
        ));
    }

    let names = resolve_sheet_names(sheets);
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for (sheet, name) in sheets.iter().zip(&names) {
        let context = format!("sheet '{name}'");
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(name)
            .map_err(|e| ExportError::render(&context, e))?;

        write_sheet(worksheet, sheet, options, &header_format)
            .map_err(|e| ExportError::render(&context, e))?;

        if options.autofit_columns {
            worksheet.autofit();
        }
    }

    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| ExportError::render("workbook", e))?;

    debug!(sheets = sheets.len(), bytes = bytes.len(), "rendered workbook");
    Ok(bytes)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &Sheet,
    options: &XlsxOptions,
    header_format: &Format,
) -> std::result::Result<(), XlsxError> {
    let mut excel_row: RowNum = 0;

    if !sheet.headers.is_empty() {
        for (col_idx, header) in sheet.headers.iter().enumerate() {
            let col = column(col_idx)?;
            if options.bold_headers {
                worksheet.write_string_with_format(0, col, header, header_format)?;
            } else {
                worksheet.write_string(0, col, header)?;
            }
        }
        excel_row = 1;
    }

    // Without headers the raw row values are written as-is.
    for row in &sheet.rows {
        for (col_idx, cell) in row.cells(&sheet.headers).into_iter().enumerate() {
            write_cell(worksheet, excel_row, column(col_idx)?, cell)?;
        }
        excel_row = excel_row
            .checked_add(1)
            .ok_or(XlsxError::RowColumnLimitError)?;
    }

    Ok(())
}

/// Null cells are left empty rather than written as text.
fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    cell: &CellValue,
) -> std::result::Result<(), XlsxError> {
    match cell {
        CellValue::Null => return Ok(()),
        CellValue::Bool(b) => worksheet.write_boolean(row, col, *b)?,
        CellValue::Number(n) if n.is_finite() => worksheet.write_number(row, col, *n)?,
        CellValue::Number(n) => worksheet.write_string(row, col, format_number(*n))?,
        CellValue::String(s) => worksheet.write_string(row, col, s)?,
    };
    Ok(())
}

fn column(idx: usize) -> std::result::Result<ColNum, XlsxError> {
    ColNum::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Resolve the tab name of every sheet, by position.
///
/// Absent or blank names become `Sheet{n}` (1-based). Collisions, compared
/// case-insensitively, get a ` (2)`, ` (3)`, ... suffix.
pub fn resolve_sheet_names(sheets: &[Sheet]) -> Vec<String> {
    let mut taken: HashSet<String> = RESERVED_NAMES.iter().map(|n| n.to_string()).collect();
    let mut names = Vec::with_capacity(sheets.len());

    for (idx, sheet) in sheets.iter().enumerate() {
        let base = sheet
            .name
            .as_deref()
            .map(sanitize_sheet_name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Sheet{}", idx + 1));

        let mut candidate = base.clone();
        let mut counter = 2;
        while taken.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({counter})");
            let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
            candidate = format!("{}{suffix}", truncate_chars(&base, keep));
            counter += 1;
        }

        if candidate != base {
            warn!(position = idx, requested = %base, resolved = %candidate, "sheet name collision");
        }

        taken.insert(candidate.to_lowercase());
        names.push(candidate);
    }

    names
}

fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    truncate_chars(replaced.trim_matches('\''), MAX_SHEET_NAME_LEN)
        .trim_end_matches('\'')
        .to_string()
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
