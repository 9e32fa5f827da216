//! Export facade: pick a renderer by format name and return the bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tally_core::ExportConfig;
use tracing::debug;

use crate::csv::render_sheet_delimited;
use crate::error::{ExportError, Result};
use crate::model::{Document, Sheet};
use crate::pdf::{render_document_bytes_with, PdfOptions};
use crate::xlsx::{render_workbook_with, XlsxOptions};

/// Output kinds the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Text,
    Spreadsheet,
    Document,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Spreadsheet => "spreadsheet",
            Self::Document => "document",
        }
    }

    /// MIME type for an HTTP response carrying this format.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Text => "text/csv",
            Self::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            Self::Document => "application/pdf",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Text => "csv",
            Self::Spreadsheet => "xlsx",
            Self::Document => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "csv" | "txt" => Ok(Self::Text),
            "spreadsheet" | "xlsx" | "excel" => Ok(Self::Spreadsheet),
            "document" | "pdf" => Ok(Self::Document),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// The content handed to the facade.
///
/// Serialized as `{"kind": "sheet" | "sheets" | "document", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ExportModel {
    Sheet(Sheet),
    Sheets(Vec<Sheet>),
    Document(Document),
}

impl ExportModel {
    /// Parse a model from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExportError::MalformedModel(format!("Invalid model JSON: {e}")))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Sheet(_) => "sheet",
            Self::Sheets(_) => "sheet list",
            Self::Document(_) => "document",
        }
    }
}

impl From<Sheet> for ExportModel {
    fn from(sheet: Sheet) -> Self {
        Self::Sheet(sheet)
    }
}

impl From<Vec<Sheet>> for ExportModel {
    fn from(sheets: Vec<Sheet>) -> Self {
        Self::Sheets(sheets)
    }
}

impl From<Document> for ExportModel {
    fn from(doc: Document) -> Self {
        Self::Document(doc)
    }
}

/// Dispatches models to renderers using a fixed configuration.
///
/// Holds no per-export state, so one exporter can serve any number of
/// threads at once.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export `model` in the format named by `format`.
    ///
    /// The format name is checked before any rendering starts.
    pub fn export(&self, format: &str, model: &ExportModel) -> Result<Vec<u8>> {
        let format: ExportFormat = format.parse()?;
        self.export_as(format, model)
    }

    pub fn export_as(&self, format: ExportFormat, model: &ExportModel) -> Result<Vec<u8>> {
        let bytes = match (format, model) {
            (ExportFormat::Text, ExportModel::Sheet(sheet)) => self.text(sheet)?,
            (ExportFormat::Text, ExportModel::Sheets(sheets)) => match sheets.as_slice() {
                [sheet] => self.text(sheet)?,
                _ => {
                    return Err(ExportError::MalformedModel(format!(
                        "text export takes exactly one sheet, got {}",
                        sheets.len()
                    )));
                }
            },
            (ExportFormat::Spreadsheet, ExportModel::Sheet(sheet)) => {
                render_workbook_with(std::slice::from_ref(sheet), &self.xlsx_options())?
            }
            (ExportFormat::Spreadsheet, ExportModel::Sheets(sheets)) => {
                render_workbook_with(sheets, &self.xlsx_options())?
            }
            (ExportFormat::Document, ExportModel::Document(doc)) => {
                render_document_bytes_with(doc, &self.pdf_options())?
            }
            (format, model) => {
                return Err(ExportError::MalformedModel(format!(
                    "{format} export cannot take a {} model",
                    model.kind()
                )));
            }
        };

        debug!(%format, bytes = bytes.len(), "export complete");
        Ok(bytes)
    }

    fn text(&self, sheet: &Sheet) -> Result<Vec<u8>> {
        Ok(render_sheet_delimited(sheet, self.config.delimiter)?.into_bytes())
    }

    fn xlsx_options(&self) -> XlsxOptions {
        XlsxOptions {
            bold_headers: self.config.bold_headers,
            autofit_columns: self.config.autofit_columns,
        }
    }

    fn pdf_options(&self) -> PdfOptions {
        PdfOptions {
            producer: self.config.producer.clone(),
        }
    }
}

/// Export with the default configuration.
pub fn export(format: &str, model: &ExportModel) -> Result<Vec<u8>> {
    Exporter::default().export(format, model)
}
