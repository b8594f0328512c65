//! Read-only inspection: line search with optional context windows.
//!
//! Nothing in this module mutates a [`Document`]; results borrow from it.

use crate::document::Document;
use crate::pattern::Pattern;
use serde::Serialize;
use std::str::Lines;

/// A single matching line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineMatch<'a> {
    /// Zero-based line index
    pub index: usize,
    pub text: &'a str,
}

/// A context window around one matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineBlock<'a> {
    /// Zero-based index of the line that matched
    pub matched: usize,
    /// Index of the first line in `lines`
    pub start: usize,
    pub lines: Vec<&'a str>,
}

impl<'a> LineBlock<'a> {
    /// Index of the last line in the window (inclusive).
    pub fn end(&self) -> usize {
        self.start + self.lines.len().saturating_sub(1)
    }

    /// `(index, text)` pairs for the window.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .map(move |(offset, line)| (self.start + offset, *line))
    }
}

/// Lazy iterator over the lines a pattern matches.
///
/// Finite and single-pass; call [`find_lines`] again to restart.
pub struct LineMatches<'a, 'p> {
    lines: std::iter::Enumerate<Lines<'a>>,
    pattern: &'p Pattern,
}

impl<'a, 'p> Iterator for LineMatches<'a, 'p> {
    type Item = LineMatch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let pattern = self.pattern;
        self.lines
            .by_ref()
            .find(|(_, line)| pattern.is_match(line))
            .map(|(index, text)| LineMatch { index, text })
    }
}

/// Lazy iterator over context windows; overlapping windows are not merged.
pub struct ContextBlocks<'a, 'p> {
    all_lines: Vec<&'a str>,
    matches: LineMatches<'a, 'p>,
    radius: usize,
}

impl<'a, 'p> Iterator for ContextBlocks<'a, 'p> {
    type Item = LineBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let hit = self.matches.next()?;
        let start = hit.index.saturating_sub(self.radius);
        let end = hit
            .index
            .saturating_add(self.radius)
            .min(self.all_lines.len().saturating_sub(1));
        Some(LineBlock {
            matched: hit.index,
            start,
            lines: self.all_lines[start..=end].to_vec(),
        })
    }
}

/// Every line of `document` on which `pattern` matches.
pub fn find_lines<'a, 'p>(document: &'a Document, pattern: &'p Pattern) -> LineMatches<'a, 'p> {
    LineMatches {
        lines: document.as_str().lines().enumerate(),
        pattern,
    }
}

/// For each matching line, the window `[index - radius, index + radius]`
/// clipped to the document's bounds.
pub fn find_lines_with_context<'a, 'p>(
    document: &'a Document,
    pattern: &'p Pattern,
    radius: usize,
) -> ContextBlocks<'a, 'p> {
    ContextBlocks {
        all_lines: document.lines().collect(),
        matches: find_lines(document, pattern),
        radius,
    }
}

/// A line that resembles a search needle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion<'a> {
    pub index: usize,
    pub text: &'a str,
    /// Normalized similarity in [0, 1]
    pub score: f64,
}

const MIN_SUGGESTION_SCORE: f64 = 0.5;

/// Lines most similar to `needle`, best first.
///
/// Used to hint at near misses when a literal search comes back empty. Lines
/// are compared after trimming; only scores of at least 0.5 are kept.
pub fn closest_lines<'a>(document: &'a Document, needle: &str, limit: usize) -> Vec<Suggestion<'a>> {
    let needle = needle.trim();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<Suggestion<'a>> = document
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, text)| Suggestion {
            index,
            text,
            score: best_window_score(text.trim(), needle),
        })
        .filter(|s| s.score >= MIN_SUGGESTION_SCORE)
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    scored.truncate(limit);
    scored
}

/// Similarity of `needle` to the best same-width window of `line`.
///
/// Long lines would otherwise always lose to short ones.
fn best_window_score(line: &str, needle: &str) -> f64 {
    let line_chars: Vec<char> = line.chars().collect();
    let width = needle.chars().count();
    if line_chars.len() <= width {
        return strsim::normalized_levenshtein(line, needle);
    }
    line_chars
        .windows(width)
        .map(|w| strsim::normalized_levenshtein(&w.iter().collect::<String>(), needle))
        .fold(0.0, f64::max)
}
