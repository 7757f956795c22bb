//! Config module - chart definitions and document loading

mod loader;
mod options;

pub use loader::{load_file, parse_document, DocumentFormat, LoadedChart};
pub use options::{ChartKind, ChartOptions, ConfigError, ImageFormat, LineShape, DEFAULT_FONT_FAMILY};
