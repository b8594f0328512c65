//! Text Patcher: pattern-guided search and backup-safe substitution
//!
//! A small utility for inspecting and patching a single source file: find
//! the lines a literal or regex matches (with context), substitute the first,
//! n-th or every match, or append items to a delimited list such as an
//! `import { ... }` clause.
//!
//! # Architecture
//!
//! All rewrites compile down to a single primitive: [`Edit`], a verified
//! byte-span replacement. Matches are always collected from an immutable
//! snapshot first and applied bottom-to-top afterwards, so a replacement never
//! shifts or creates another match.
//!
//! Inspection ([`search`]) and mutation ([`substitute`], [`list`], [`write`])
//! are separate entry points; nothing reads ambient globals or the working
//! directory.
//!
//! # Safety
//!
//! - Every edit verifies its expected before-text
//! - The original file is backed up, and the backup verified, before the
//!   destination is touched
//! - Atomic file writes (tempfile + fsync + rename)
//! - UTF-8 validation on load
//!
//! # Example
//!
//! ```no_run
//! use text_patcher::{insert_into_delimited_list, write_with_backup, Document};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), text_patcher::PatchError> {
//! let path = Path::new("src/components/HR/AdvanceDeductionModule.tsx");
//! let doc = Document::load(path)?;
//! let result = insert_into_delimited_list(&doc, "{", "}", &["Clock"], true)?;
//! if result.changed() {
//!     write_with_backup(path, result.document.as_str())?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod list;
pub mod pattern;
pub mod search;
pub mod substitute;
pub mod write;

// Re-exports
pub use config::{
    apply_recipe, check_recipe, load_from_path, load_from_str, ApplicationError, ApplyOptions,
    ConfigError, Recipe, RecipeReport, StepResult,
};
pub use document::Document;
pub use edit::{apply_edits, Edit, EditError, EditVerification};
pub use error::PatchError;
pub use list::{insert_into_delimited_list, insert_into_delimited_list_after, ListInsertion};
pub use pattern::{Match, Pattern};
pub use search::{
    closest_lines, find_lines, find_lines_with_context, LineBlock, LineMatch, Suggestion,
};
pub use substitute::{
    substitute_all, substitute_first, substitute_first_from, substitute_nth, Substitution,
};
pub use write::{
    backup_path_for, write_with_backup, write_with_backup_to, WriteOutcome, DEFAULT_BACKUP_SUFFIX,
};
