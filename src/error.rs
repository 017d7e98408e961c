#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by the executor for a single filesystem request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("not found")]
    NotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("already exists")]
    AlreadyExists,
    #[error("is a directory")]
    IsADirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("{0}")]
    Unknown(String),
}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound,
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied,
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists,
            io::ErrorKind::IsADirectory => FsError::IsADirectory,
            io::ErrorKind::DirectoryNotEmpty => FsError::NotEmpty,
            _ => FsError::Unknown(err.to_string()),
        }
    }
}

/// Failure of a whole user action, surfaced once in the message bar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("cannot read {}: {source}", .path.display())]
    Access { path: PathBuf, source: FsError },
    #[error("{} no longer exists", .0.display())]
    NotFound(PathBuf),
    #[error("'{0}' already exists")]
    AlreadyExists(String),
    #[error("rename works on one item, clear the selection first")]
    AmbiguousTarget,
    #[error("cannot paste {} into itself or a subdirectory of it", .0.display())]
    InvalidTarget(PathBuf),
    #[error("invalid name '{0}'")]
    InvalidName(String),
    #[error("nothing to paste")]
    NothingToPaste,
    #[error("{0}")]
    Unknown(String),
}

impl ActionError {
    /// Maps an executor failure on `path` to the action-level taxonomy.
    pub fn from_fs(path: PathBuf, err: FsError) -> Self {
        match err {
            FsError::NotFound => ActionError::NotFound(path),
            FsError::AlreadyExists => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                ActionError::AlreadyExists(name)
            }
            FsError::PermissionDenied => ActionError::Access { path, source: err },
            other => ActionError::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewReason {
    TooLarge,
    Binary,
    IsDirectory,
    Special,
    Unreadable,
    NoEntry,
}

impl PreviewReason {
    pub fn message(self) -> &'static str {
        match self {
            PreviewReason::TooLarge => "file too large for preview",
            PreviewReason::Binary => "file is not a text file",
            PreviewReason::IsDirectory => "cannot preview directories",
            PreviewReason::Special => "cannot preview special files",
            PreviewReason::Unreadable => "cannot read file",
            PreviewReason::NoEntry => "nothing to preview",
        }
    }
}

/// A declined preview request. Not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .reason.message())]
pub struct PreviewUnavailable {
    pub reason: PreviewReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    #[error("option {0} requires a value")]
    MissingValue(String),
    #[error("unknown option {0}")]
    UnknownOption(String),
    #[error("unexpected argument {0}")]
    UnexpectedArgument(String),
}
