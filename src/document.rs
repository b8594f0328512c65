//! In-memory text documents.

use crate::error::PatchError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// An owned text buffer, optionally remembering where it was loaded from.
///
/// Operations take a `&Document` and hand back a new one; the source of a scan
/// is never mutated while matches are being computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: Option<PathBuf>,
    text: String,
}

impl Document {
    /// Wrap text that did not come from disk.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            path: None,
            text: text.into(),
        }
    }

    /// Load a UTF-8 document from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PatchError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| PatchError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| PatchError::InvalidUtf8 {
            path: path.to_path_buf(),
        })?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "loaded document");
        Ok(Self {
            path: Some(path.to_path_buf()),
            text,
        })
    }

    /// Derive a document with new text, keeping the source path.
    pub(crate) fn with_text(&self, text: String) -> Self {
        Self {
            path: self.path.clone(),
            text,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Lines split on `\n`, with a trailing `\r` removed from each.
    ///
    /// A final newline does not produce an extra empty line.
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.text.lines()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Document::from_text(text)
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Document::from_text(text)
    }
}
