// Report export: one tabular model rendered as delimited text, XLSX or PDF.

pub mod csv;
pub mod error;
pub mod export;
pub mod model;
pub mod pdf;
pub mod xlsx;

pub use error::{ExportError, Result};
pub use export::{export, ExportFormat, ExportModel, Exporter};
pub use model::{CellValue, Document, Row, Section, Sheet, Table};
