//! Error types for femx-io

use std::fs;
use std::path::{Path, PathBuf};

use femx_text::{FieldError, UnexpectedEndOfInput};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Structural failure of one ingestion call.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    UnexpectedEnd {
        path: PathBuf,
        source: UnexpectedEndOfInput,
    },

    #[error("{}: line {}: {source}", .path.display(), .source.line())]
    Field { path: PathBuf, source: FieldError },

    #[error("{}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{}: line {line}: {message}", .path.display())]
    InvalidHeader {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("cannot determine the mesh format of {}", .0.display())]
    UnknownFormat(PathBuf),
}

impl IngestError {
    pub fn invalid_header(path: &Path, line: usize, message: impl Into<String>) -> Self {
        IngestError::InvalidHeader {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// File the failure refers to.
    pub fn path(&self) -> &Path {
        match self {
            IngestError::Io { path, .. }
            | IngestError::UnexpectedEnd { path, .. }
            | IngestError::Field { path, .. }
            | IngestError::Csv { path, .. }
            | IngestError::InvalidHeader { path, .. } => path,
            IngestError::UnknownFormat(path) => path,
        }
    }

    /// 1-based line number, when the failure points at one.
    pub fn line(&self) -> Option<usize> {
        match self {
            IngestError::UnexpectedEnd { source, .. } => Some(source.last_line),
            IngestError::Field { source, .. } => Some(source.line()),
            IngestError::InvalidHeader { line, .. } => Some(*line),
            IngestError::Csv { source, .. } => source
                .position()
                .and_then(|pos| usize::try_from(pos.line()).ok()),
            IngestError::Io { .. } | IngestError::UnknownFormat(_) => None,
        }
    }

    /// Message without the file and line, for diagnostics that carry both.
    pub fn detail(&self) -> String {
        match self {
            IngestError::Io { source, .. } => format!("cannot read file: {source}"),
            IngestError::UnexpectedEnd { source, .. } => source.to_string(),
            IngestError::Field { source, .. } => source.to_string(),
            IngestError::Csv { source, .. } => source.to_string(),
            IngestError::InvalidHeader { message, .. } => message.clone(),
            IngestError::UnknownFormat(_) => self.to_string(),
        }
    }
}

/// Attach the offending file to line-level errors.
pub(crate) trait InFile<T> {
    fn in_file(self, path: &Path) -> Result<T>;
}

impl<T> InFile<T> for std::result::Result<T, FieldError> {
    fn in_file(self, path: &Path) -> Result<T> {
        self.map_err(|source| IngestError::Field {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T> InFile<T> for std::result::Result<T, UnexpectedEndOfInput> {
    fn in_file(self, path: &Path) -> Result<T> {
        self.map_err(|source| IngestError::UnexpectedEnd {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T> InFile<T> for std::result::Result<T, csv::Error> {
    fn in_file(self, path: &Path) -> Result<T> {
        self.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub(crate) fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}
