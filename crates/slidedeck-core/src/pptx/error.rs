use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing a presentation package.
#[derive(Debug, Error)]
pub enum PptxError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed XML in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("Not a presentation: {0}")]
    InvalidPackage(String),

    #[error("Layout index {index} out of range (template has {count} layouts)")]
    LayoutOutOfRange { index: usize, count: usize },

    #[error("Layout '{layout}' has no placeholder with idx {idx}")]
    PlaceholderNotFound { layout: String, idx: u32 },

    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),
}

impl PptxError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PptxError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn xml(part: impl Into<String>, message: impl ToString) -> Self {
        PptxError::Xml {
            part: part.into(),
            message: message.to_string(),
        }
    }
}
