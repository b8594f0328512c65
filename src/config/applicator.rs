//! Recipe applicator - runs recipe steps against one document
//!
//! This module provides high-level recipe application that:
//! - Resolves the target file without consulting the working directory
//! - Runs every step in order on an in-memory document
//! - Escalates zero matches to a failure only for `required` steps
//! - Writes once, behind a backup, and only when every step succeeded

use crate::config::schema::{Operation, Recipe, StepDefinition};
use crate::document::Document;
use crate::error::PatchError;
use crate::list::{insert_into_delimited_list, insert_into_delimited_list_after};
use crate::substitute::{substitute_all, substitute_first, substitute_nth};
use crate::write::{backup_path_for, write_with_backup_to, WriteOutcome, DEFAULT_BACKUP_SUFFIX};
use std::fmt;
use std::path::{Path, PathBuf};

/// Result of running a single step
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "StepResult should be checked for applied/unchanged"]
pub enum StepResult {
    /// The step rewrote `count` spans or list items
    Applied { count: usize },
    /// Nothing to do (no match, or every list item already present)
    Unchanged { reason: String },
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepResult::Applied { count } => write!(f, "Applied ({} change(s))", count),
            StepResult::Unchanged { reason } => write!(f, "Unchanged: {}", reason),
        }
    }
}

/// Errors that stop a recipe before any step can run or after all have run.
#[derive(Debug)]
pub enum ApplicationError {
    /// Recipe has no `meta.target` and none was supplied
    MissingTarget,
    /// Backup suffix is empty or whitespace, so the backup would replace the target
    InvalidBackupSuffix(String),
    /// Target document could not be loaded
    Document(PatchError),
    /// Backup or destination write failed
    Write(PatchError),
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::MissingTarget => {
                write!(f, "recipe has no target file (set meta.target or pass --target)")
            }
            ApplicationError::InvalidBackupSuffix(suffix) => {
                write!(f, "backup suffix {:?} must contain a visible character", suffix)
            }
            ApplicationError::Document(e) => write!(f, "cannot load target: {}", e),
            ApplicationError::Write(e) => write!(f, "write failed: {}", e),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::MissingTarget | ApplicationError::InvalidBackupSuffix(_) => None,
            ApplicationError::Document(e) | ApplicationError::Write(e) => Some(e),
        }
    }
}

/// Options shared by apply and check.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Overrides `meta.backup_suffix`
    pub backup_suffix: Option<String>,
    /// Evaluate every step but never write
    pub dry_run: bool,
}

/// Everything a caller needs to report on one recipe run.
#[derive(Debug)]
pub struct RecipeReport {
    pub target: PathBuf,
    pub steps: Vec<(String, Result<StepResult, PatchError>)>,
    pub original: String,
    pub patched: String,
    /// Set when the patched content was persisted
    pub written: Option<WriteOutcome>,
}

impl RecipeReport {
    pub fn failed(&self) -> usize {
        self.steps.iter().filter(|(_, r)| r.is_err()).count()
    }

    pub fn changed(&self) -> bool {
        self.original != self.patched
    }
}

/// Resolve the file a recipe patches.
///
/// An explicit `override_target` wins. Otherwise `meta.target` is used, with
/// relative paths taken against `recipe_dir`.
pub fn resolve_target(
    recipe: &Recipe,
    recipe_dir: Option<&Path>,
    override_target: Option<&Path>,
) -> Result<PathBuf, ApplicationError> {
    if let Some(path) = override_target {
        return Ok(path.to_path_buf());
    }
    let target = recipe
        .meta
        .target
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or(ApplicationError::MissingTarget)?;
    let target = Path::new(target);
    Ok(match recipe_dir {
        Some(dir) if target.is_relative() => dir.join(target),
        _ => target.to_path_buf(),
    })
}

/// Run every step and, unless `options.dry_run`, persist the result.
pub fn apply_recipe(
    recipe: &Recipe,
    target: &Path,
    options: &ApplyOptions,
) -> Result<RecipeReport, ApplicationError> {
    let suffix = options
        .backup_suffix
        .as_deref()
        .or(recipe.meta.backup_suffix.as_deref())
        .unwrap_or(DEFAULT_BACKUP_SUFFIX);
    if suffix.trim().is_empty() {
        return Err(ApplicationError::InvalidBackupSuffix(suffix.to_string()));
    }

    let document = Document::load(target).map_err(ApplicationError::Document)?;
    let original = document.as_str().to_string();

    let mut current = document;
    let mut steps = Vec::with_capacity(recipe.steps.len());
    for step in &recipe.steps {
        let span = tracing::debug_span!("step", id = %step.id, op = step.operation.name());
        let _guard = span.enter();
        match run_step(&current, step) {
            Ok((next, result)) => {
                current = next;
                steps.push((step.id.clone(), Ok(result)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "step failed");
                steps.push((step.id.clone(), Err(e)));
            }
        }
    }

    let patched = current.into_string();
    let mut report = RecipeReport {
        target: target.to_path_buf(),
        steps,
        original,
        patched,
        written: None,
    };

    if options.dry_run || report.failed() > 0 || !report.changed() {
        tracing::info!(
            target = %target.display(),
            dry_run = options.dry_run,
            failed = report.failed(),
            changed = report.changed(),
            "recipe evaluated without writing"
        );
        return Ok(report);
    }

    let backup = backup_path_for(target, suffix);
    let outcome =
        write_with_backup_to(target, &backup, &report.patched).map_err(ApplicationError::Write)?;
    report.written = Some(outcome);

    Ok(report)
}

/// Evaluate a recipe without touching the filesystem.
pub fn check_recipe(recipe: &Recipe, target: &Path) -> Result<RecipeReport, ApplicationError> {
    let options = ApplyOptions {
        dry_run: true,
        ..ApplyOptions::default()
    };
    apply_recipe(recipe, target, &options)
}

/// Run one step against `document`, returning the next document.
fn run_step(
    document: &Document,
    step: &StepDefinition,
) -> Result<(Document, StepResult), PatchError> {
    let pattern = step.pattern.as_ref().map(|spec| spec.compile()).transpose()?;

    let (next, count) = match (&step.operation, pattern.as_ref()) {
        (Operation::ReplaceFirst { text }, Some(pattern)) => {
            let s = substitute_first(document, pattern, text)?;
            (s.document, s.count)
        }
        (Operation::ReplaceAll { text }, Some(pattern)) => {
            let s = substitute_all(document, pattern, text)?;
            (s.document, s.count)
        }
        (Operation::ReplaceNth { text, n }, Some(pattern)) => {
            let s = substitute_nth(document, pattern, text, *n)?;
            (s.document, s.count)
        }
        (
            Operation::InsertIntoList {
                open,
                close,
                items,
                skip_if_present,
            },
            anchor,
        ) => {
            let insertion = match anchor {
                Some(anchor) => insert_into_delimited_list_after(
                    document,
                    anchor,
                    open,
                    close,
                    items.as_slice(),
                    *skip_if_present,
                )?,
                None => {
                    insert_into_delimited_list(
                        document,
                        open,
                        close,
                        items.as_slice(),
                        *skip_if_present,
                    )?
                }
            };
            let count = insertion.inserted.len();
            if count == 0 {
                return Ok((
                    insertion.document,
                    StepResult::Unchanged {
                        reason: "all items already present".to_string(),
                    },
                ));
            }
            (insertion.document, count)
        }
        (op, None) => {
            return Err(PatchError::pattern_not_found(format!(
                "{} step '{}' has no pattern",
                op.name(),
                step.id
            )))
        }
    };

    if count > 0 {
        return Ok((next, StepResult::Applied { count }));
    }

    let described = step
        .pattern
        .as_ref()
        .map(|spec| spec.value().to_string())
        .unwrap_or_default();
    if step.required {
        return Err(PatchError::pattern_not_found(described));
    }
    Ok((
        next,
        StepResult::Unchanged {
            reason: format!("no match for {described:?}"),
        },
    ))
}
