//! Error types for loading workbooks and writing reports

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening or parsing a workbook
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The extension is not a supported workbook format
    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A part the workbook cannot be read without is absent
    #[error("missing required part: {0}")]
    MissingPart(String),

    /// The package is present but its content is malformed
    #[error("invalid workbook: {0}")]
    Invalid(String),
}

impl LoadError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LoadError::Invalid(message.into())
    }
}

/// Errors raised while writing an analysis report
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of the per-file pipeline
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;
