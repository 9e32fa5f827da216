pub mod config;
pub mod logging;

pub use config::ExportConfig;
pub use logging::{init_console_logging, init_logging, init_logging_to_dir};
