use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DalError {
    #[error("Io: failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Decode: {} is not valid json", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("UnrecognizedFormat: {}: {reason}", path.display())]
    UnrecognizedFormat { path: PathBuf, reason: String },

    #[error("MissingField: {kind} in {} has no usable '{field}'", path.display())]
    MissingField {
        kind: RecordKind,
        field: &'static str,
        path: PathBuf,
    },

    #[error("InvalidTimestamp: {kind} {id} has time {value}")]
    InvalidTimestamp {
        kind: RecordKind,
        id: String,
        value: String,
    },

    #[error("DanglingReference: highlight {highlight_id} points at unknown bookmark {bookmark_id}")]
    DanglingReference {
        highlight_id: String,
        bookmark_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Bookmark,
    Highlight,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Bookmark => "bookmark",
            RecordKind::Highlight => "highlight",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum HandlerError {
    DalError(DalError),
    TaskError(tokio::task::JoinError),
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use HandlerError::*;
        match self {
            DalError(e) => write!(f, "DalError: {}", crate::unpack_error(e)),
            TaskError(e) => write!(f, "TaskError: {}", e),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use HandlerError::*;
        match self {
            DalError(e) => Some(e),
            TaskError(e) => Some(e),
        }
    }
}

impl From<DalError> for HandlerError {
    fn from(error: DalError) -> Self {
        HandlerError::DalError(error)
    }
}

impl From<tokio::task::JoinError> for HandlerError {
    fn from(error: tokio::task::JoinError) -> Self {
        HandlerError::TaskError(error)
    }
}
