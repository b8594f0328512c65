//! Patterns and the matches they produce.
//!
//! A [`Pattern`] is either a literal substring or a compiled regular
//! expression. Both are built through named constructors that validate once,
//! so call sites never re-author or re-check raw regex strings.

use crate::error::PatchError;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// A literal or regular-expression matcher.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact substring match
    Literal(String),
    /// Compiled regular expression; capture groups are reported positionally
    Regex(Regex),
}

/// A located occurrence of a [`Pattern`] within a text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Starting byte offset (inclusive)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
    /// The matched text
    pub text: String,
    /// Capture groups 1..n; `None` for groups that did not participate
    pub captures: Vec<Option<String>>,
}

impl Match {
    /// Positional capture group, 1-based like `$1`.
    pub fn group(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.captures.get(i))
            .and_then(|c| c.as_deref())
    }
}

impl Pattern {
    /// Literal substring pattern. Empty literals are rejected.
    pub fn literal(text: impl Into<String>) -> Result<Self, PatchError> {
        let text = text.into();
        if text.is_empty() {
            return Err(PatchError::EmptyPattern);
        }
        Ok(Pattern::Literal(text))
    }

    /// Regular-expression pattern, compiled once.
    pub fn regex(source: &str) -> Result<Self, PatchError> {
        if source.is_empty() {
            return Err(PatchError::EmptyPattern);
        }
        Regex::new(source)
            .map(Pattern::Regex)
            .map_err(|source_err| PatchError::InvalidPattern {
                pattern: source.to_string(),
                source: source_err,
            })
    }

    /// Build either kind from a string, as the CLI and recipes do.
    pub fn parse(source: &str, is_regex: bool) -> Result<Self, PatchError> {
        if is_regex {
            Self::regex(source)
        } else {
            Self::literal(source)
        }
    }

    /// The source text of the pattern.
    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Literal(text) => text,
            Pattern::Regex(re) => re.as_str(),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Pattern::Regex(_))
    }

    /// Whether the pattern matches anywhere in `haystack`.
    pub fn is_match(&self, haystack: &str) -> bool {
        match self {
            Pattern::Literal(text) => haystack.contains(text.as_str()),
            Pattern::Regex(re) => re.is_match(haystack),
        }
    }

    /// First match at or after byte offset `from`.
    pub fn find_from(&self, haystack: &str, from: usize) -> Option<Match> {
        if from > haystack.len() {
            return None;
        }
        match self {
            Pattern::Literal(text) => {
                let rest = haystack.get(from..)?;
                rest.find(text.as_str()).map(|offset| Match {
                    start: from + offset,
                    end: from + offset + text.len(),
                    text: text.clone(),
                    captures: Vec::new(),
                })
            }
            Pattern::Regex(re) => re.captures_at(haystack, from).map(|caps| capture_match(&caps)),
        }
    }

    /// Every non-overlapping match, scanned left to right.
    pub fn find_all(&self, haystack: &str) -> Vec<Match> {
        match self {
            Pattern::Literal(text) => haystack
                .match_indices(text.as_str())
                .map(|(start, matched)| Match {
                    start,
                    end: start + matched.len(),
                    text: matched.to_string(),
                    captures: Vec::new(),
                })
                .collect(),
            Pattern::Regex(re) => re
                .captures_iter(haystack)
                .map(|caps| capture_match(&caps))
                .collect(),
        }
    }

    /// [`find_all`](Self::find_all), with `replacement` rendered for each
    /// match during the same scan.
    ///
    /// Regex replacements expand `$1`, `${1}` and `${name}` against the match;
    /// `$$` produces a literal dollar. Literal replacements are used verbatim.
    pub fn find_all_expanded(&self, haystack: &str, replacement: &str) -> Vec<(Match, String)> {
        match self {
            Pattern::Literal(_) => self
                .find_all(haystack)
                .into_iter()
                .map(|m| (m, replacement.to_string()))
                .collect(),
            Pattern::Regex(re) => re
                .captures_iter(haystack)
                .map(|caps| (capture_match(&caps), render(&caps, replacement)))
                .collect(),
        }
    }

    /// [`find_from`](Self::find_from), with `replacement` rendered for the match.
    pub fn find_from_expanded(
        &self,
        haystack: &str,
        from: usize,
        replacement: &str,
    ) -> Option<(Match, String)> {
        match self {
            Pattern::Literal(_) => self
                .find_from(haystack, from)
                .map(|m| (m, replacement.to_string())),
            Pattern::Regex(re) => {
                if from > haystack.len() {
                    return None;
                }
                re.captures_at(haystack, from)
                    .map(|caps| (capture_match(&caps), render(&caps, replacement)))
            }
        }
    }
}

fn render(caps: &regex::Captures<'_>, replacement: &str) -> String {
    let mut out = String::new();
    caps.expand(replacement, &mut out);
    out
}

fn capture_match(caps: &regex::Captures<'_>) -> Match {
    let whole = caps.get_match();
    Match {
        start: whole.start(),
        end: whole.end(),
        text: whole.as_str().to_string(),
        captures: caps
            .iter()
            .skip(1)
            .map(|group| group.map(|g| g.as_str().to_string()))
            .collect(),
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(text) => write!(f, "{text:?}"),
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}
