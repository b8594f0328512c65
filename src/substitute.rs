//! Guarded substitution.
//!
//! Every operation is two passes: matches are collected from the untouched
//! input, turned into verified span [`Edit`]s, and only then applied. A
//! replacement therefore never creates or destroys a later match.

use crate::document::Document;
use crate::edit::{apply_edits, Edit};
use crate::error::PatchError;
use crate::pattern::{Match, Pattern};

/// Outcome of a substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Substitution carries the rewritten document"]
pub struct Substitution {
    pub document: Document,
    /// Number of spans replaced
    pub count: usize,
}

impl Substitution {
    /// Whether anything was replaced.
    pub fn matched(&self) -> bool {
        self.count > 0
    }

    fn unchanged(document: &Document) -> Self {
        Self {
            document: document.clone(),
            count: 0,
        }
    }
}

/// Replace only the first match. No match is a no-op, not an error.
pub fn substitute_first(
    document: &Document,
    pattern: &Pattern,
    replacement: &str,
) -> Result<Substitution, PatchError> {
    substitute_first_from(document, pattern, replacement, 0)
}

/// Replace the first match that starts at or after byte `offset`.
pub fn substitute_first_from(
    document: &Document,
    pattern: &Pattern,
    replacement: &str,
    offset: usize,
) -> Result<Substitution, PatchError> {
    match pattern.find_from_expanded(document.as_str(), offset, replacement) {
        Some(hit) => replace_matches(document, pattern, vec![hit]),
        None => {
            tracing::warn!(%pattern, offset, "no match; document left unchanged");
            Ok(Substitution::unchanged(document))
        }
    }
}

/// Replace only the `n`-th match (zero-based), leaving the others untouched.
pub fn substitute_nth(
    document: &Document,
    pattern: &Pattern,
    replacement: &str,
    n: usize,
) -> Result<Substitution, PatchError> {
    let matches = pattern.find_all_expanded(document.as_str(), replacement);
    tracing::debug!(%pattern, found = matches.len(), n, "selecting occurrence");
    match matches.into_iter().nth(n) {
        Some(hit) => replace_matches(document, pattern, vec![hit]),
        None => {
            tracing::warn!(%pattern, n, "occurrence not present; document left unchanged");
            Ok(Substitution::unchanged(document))
        }
    }
}

/// Replace every non-overlapping match, found left to right on the original.
pub fn substitute_all(
    document: &Document,
    pattern: &Pattern,
    replacement: &str,
) -> Result<Substitution, PatchError> {
    let matches = pattern.find_all_expanded(document.as_str(), replacement);
    if matches.is_empty() {
        tracing::warn!(%pattern, "no match; document left unchanged");
        return Ok(Substitution::unchanged(document));
    }
    replace_matches(document, pattern, matches)
}

/// Lower rendered matches to span edits and apply them in one batch.
fn replace_matches(
    document: &Document,
    pattern: &Pattern,
    matches: Vec<(Match, String)>,
) -> Result<Substitution, PatchError> {
    let count = matches.len();
    let edits: Vec<Edit> = matches
        .into_iter()
        .map(|(m, rendered)| Edit::new(m.start, m.end, rendered, &m.text))
        .collect();

    let rewritten = apply_edits(document.as_str(), edits)?;
    tracing::debug!(%pattern, count, "substituted");

    Ok(Substitution {
        document: document.with_text(rewritten),
        count,
    })
}
