//! Error types for report generation.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while fetching records or producing a report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The infant records could not be obtained from the data source.
    #[error("Failed to fetch infant records: {0}")]
    Fetch(String),

    /// A record violated the expected shape (bad date, frequency, percentage).
    #[error("Invalid record data: {0}")]
    Data(String),

    /// The drawing backend rejected an operation or failed to serialize.
    #[error("Drawing failed: {0}")]
    Draw(String),

    /// Fonts for the compliance sheet could not be located or loaded.
    #[error("Font error: {0}")]
    Font(String),

    /// The settings file could not be parsed.
    #[error("Invalid settings: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document outline could not be written into the rendered PDF.
    #[cfg(feature = "bookmarks")]
    #[error("Failed to add bookmarks: {0}")]
    Bookmark(#[from] crate::bookmarks::BookmarkError),
}

impl From<genpdf::error::Error> for ReportError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::Draw(err.to_string())
    }
}
