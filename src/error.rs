use crate::edit::EditError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by patch operations.
///
/// Zero matches during a scan is not an error; only operations that need a
/// structural anchor escalate absence to [`PatchError::PatternNotFound`].
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("cannot read {path}: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expected anchor not found: {anchor}")]
    PatternNotFound { anchor: String },

    #[error("failed to write backup {backup} for {path}: {source}")]
    BackupFailed {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backup {backup} does not match the original content")]
    BackupMismatch { backup: PathBuf },

    #[error("failed to write {path} (original preserved in {backup}): {source}")]
    WriteFailed {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid regex '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern must not be empty")]
    EmptyPattern,

    #[error("{path} is not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },

    #[error("edit error: {0}")]
    Edit(#[from] EditError),
}

impl PatchError {
    pub(crate) fn pattern_not_found(anchor: impl Into<String>) -> Self {
        PatchError::PatternNotFound {
            anchor: anchor.into(),
        }
    }
}
