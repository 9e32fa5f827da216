//! Export error types.

/// Errors produced while exporting a report.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The requested output kind is not one of the known formats.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// The model does not fit the requested format or is not well formed.
    #[error("Malformed model: {0}")]
    MalformedModel(String),

    /// An encoding step failed. `context` names the sheet, section or stage.
    #[error("Failed to render {context}: {message}")]
    RenderFailure { context: String, message: String },

    /// Writing to the document sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub(crate) fn render(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::RenderFailure {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
