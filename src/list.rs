//! Appending items to a delimited list, e.g. the braces of an import clause.
//!
//! `import { A, B } from 'x';` with items `["C"]` becomes
//! `import { A, B, C } from 'x';`. The region must exist: a missing list is
//! reported as [`PatchError::PatternNotFound`] rather than guessed at.

use crate::document::Document;
use crate::edit::Edit;
use crate::error::PatchError;
use crate::pattern::Pattern;

/// Outcome of a list insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ListInsertion carries the rewritten document"]
pub struct ListInsertion {
    pub document: Document,
    /// Items actually added, in order
    pub inserted: Vec<String>,
}

impl ListInsertion {
    pub fn changed(&self) -> bool {
        !self.inserted.is_empty()
    }
}

/// Byte offsets of a delimited region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Offset of the opening delimiter
    pub open: usize,
    /// First byte after the opening delimiter
    pub inner_start: usize,
    /// Offset of the matching closing delimiter
    pub close: usize,
}

/// Find the first `open`..`close` region at or after byte `from`.
///
/// Nested pairs of the same delimiters are skipped over, so `{ a: { b } }`
/// resolves to the outer braces. When `open == close` the next occurrence
/// closes the region.
pub fn find_region(text: &str, from: usize, open: &str, close: &str) -> Option<Region> {
    let open_at = from + text.get(from..)?.find(open)?;
    let inner_start = open_at + open.len();

    let mut depth = 1usize;
    let mut pos = inner_start;
    while pos < text.len() {
        let rest = &text[pos..];
        if rest.starts_with(close) {
            depth -= 1;
            if depth == 0 {
                return Some(Region {
                    open: open_at,
                    inner_start,
                    close: pos,
                });
            }
            pos += close.len();
        } else if open != close && rest.starts_with(open) {
            depth += 1;
            pos += open.len();
        } else {
            pos += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}

/// Append each of `new_items` to the first delimited list in `document`.
///
/// With `skip_if_present`, items already contained (as substrings) in the
/// region are left out, which makes repeated runs idempotent.
///
/// Items go after the last item, before a trailing `// comment` on its line:
/// `{\n  A, // icons\n}` becomes `{\n  A, B // icons\n}`.
pub fn insert_into_delimited_list(
    document: &Document,
    open: &str,
    close: &str,
    new_items: &[impl AsRef<str>],
    skip_if_present: bool,
) -> Result<ListInsertion, PatchError> {
    insert_from(document, 0, open, close, new_items, skip_if_present)
}

/// Like [`insert_into_delimited_list`], but the search for `open` starts at
/// the first match of `anchor`.
pub fn insert_into_delimited_list_after(
    document: &Document,
    anchor: &Pattern,
    open: &str,
    close: &str,
    new_items: &[impl AsRef<str>],
    skip_if_present: bool,
) -> Result<ListInsertion, PatchError> {
    let anchor_match = anchor
        .find_from(document.as_str(), 0)
        .ok_or_else(|| PatchError::pattern_not_found(anchor.to_string()))?;
    insert_from(
        document,
        anchor_match.start,
        open,
        close,
        new_items,
        skip_if_present,
    )
}

fn insert_from(
    document: &Document,
    from: usize,
    open: &str,
    close: &str,
    new_items: &[impl AsRef<str>],
    skip_if_present: bool,
) -> Result<ListInsertion, PatchError> {
    if open.is_empty() || close.is_empty() {
        return Err(PatchError::EmptyPattern);
    }

    let text = document.as_str();
    let region = find_region(text, from, open, close)
        .ok_or_else(|| PatchError::pattern_not_found(format!("{open}...{close}")))?;
    let inner = &text[region.inner_start..region.close];

    let mut inserted: Vec<String> = Vec::new();
    for item in new_items {
        let item = item.as_ref().trim();
        if item.is_empty() {
            continue;
        }
        let present = inner.contains(item) || inserted.iter().any(|i| i.contains(item));
        if skip_if_present && present {
            tracing::debug!(item, "already present in list; skipping");
            continue;
        }
        inserted.push(item.to_string());
    }

    if inserted.is_empty() {
        return Ok(ListInsertion {
            document: document.clone(),
            inserted,
        });
    }

    let content = list_content(inner);
    let (offset, lead) = if content.trim_start().is_empty() {
        (region.inner_start + leading_whitespace(inner), "")
    } else if content.ends_with(',') {
        (region.inner_start + content.len(), " ")
    } else {
        (region.inner_start + content.len(), ", ")
    };

    let edit = Edit::insert(offset, format!("{lead}{}", inserted.join(", ")));
    let rewritten = edit.apply_to(text)?;
    tracing::debug!(items = ?inserted, at = offset, "inserted into delimited list");

    Ok(ListInsertion {
        document: document.with_text(rewritten),
        inserted,
    })
}

/// Region text up to the last list item, ignoring trailing whitespace and any
/// `//` comment that closes out the last line.
///
/// A `//` inside a string literal on that line is treated as a comment too.
fn list_content(inner: &str) -> &str {
    let mut content = inner.trim_end();
    loop {
        let line_start = content.rfind('\n').map_or(0, |i| i + 1);
        match content[line_start..].find("//") {
            Some(comment) => content = content[..line_start + comment].trim_end(),
            None => return content,
        }
    }
}

fn leading_whitespace(s: &str) -> usize {
    s.len() - s.trim_start().len()
}
