use crate::error::PatchError;
use crate::pattern::Pattern;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// A patch recipe: ordered steps against one target file.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Recipe {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

impl Recipe {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.steps.is_empty() {
            issues.push(ValidationIssue::EmptyStepList);
        }

        if let Some(suffix) = &self.meta.backup_suffix {
            if suffix.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    step_id: None,
                    field: "meta.backup_suffix",
                });
            }
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            let step_id = Some(step.id.clone());

            if step.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    step_id: None,
                    field: "id",
                });
            } else if !seen.insert(step.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    step_id: step.id.clone(),
                });
            }

            match &step.pattern {
                Some(spec) => {
                    if spec.value().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            step_id: step_id.clone(),
                            field: "pattern.value",
                        });
                    } else if let Err(err) = spec.compile() {
                        issues.push(ValidationIssue::InvalidPattern {
                            step_id: step_id.clone(),
                            message: err.to_string(),
                        });
                    }
                }
                None if step.operation.requires_pattern() => {
                    issues.push(ValidationIssue::MissingField {
                        step_id: step_id.clone(),
                        field: "pattern",
                    });
                }
                None => {}
            }

            if let Operation::InsertIntoList {
                open, close, items, ..
            } = &step.operation
            {
                if open.is_empty() || close.is_empty() {
                    issues.push(ValidationIssue::InvalidCombo {
                        step_id: step_id.clone(),
                        message: "insert-into-list delimiters must not be empty".to_string(),
                    });
                }
                if items.iter().all(|item| item.trim().is_empty()) {
                    issues.push(ValidationIssue::MissingField {
                        step_id: step_id.clone(),
                        field: "operation.items",
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// File to patch; relative paths resolve against the recipe's directory
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub backup_suffix: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StepDefinition {
    pub id: String,
    /// Match pattern for replacements; anchor for list insertion
    #[serde(default)]
    pub pattern: Option<PatternSpec>,
    pub operation: Operation,
    /// Treat zero matches as a failure instead of a no-op
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PatternSpec {
    /// Exact substring
    Literal { value: String },
    /// Regular expression; replacements may use `$1`, `${name}`
    Regex { value: String },
}

impl PatternSpec {
    pub fn value(&self) -> &str {
        match self {
            PatternSpec::Literal { value } | PatternSpec::Regex { value } => value,
        }
    }

    pub fn compile(&self) -> Result<Pattern, PatchError> {
        match self {
            PatternSpec::Literal { value } => Pattern::literal(value.as_str()),
            PatternSpec::Regex { value } => Pattern::regex(value),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    /// Replace the first match; an empty `text` deletes it
    ReplaceFirst {
        #[serde(default)]
        text: String,
    },
    ReplaceAll {
        #[serde(default)]
        text: String,
    },
    /// Replace only the n-th (zero-based) match
    ReplaceNth {
        #[serde(default)]
        text: String,
        n: usize,
    },
    InsertIntoList {
        #[serde(default = "default_open")]
        open: String,
        #[serde(default = "default_close")]
        close: String,
        items: Vec<String>,
        #[serde(default = "default_true")]
        skip_if_present: bool,
    },
}

impl Operation {
    pub fn requires_pattern(&self) -> bool {
        !matches!(self, Operation::InsertIntoList { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ReplaceFirst { .. } => "replace-first",
            Operation::ReplaceAll { .. } => "replace-all",
            Operation::ReplaceNth { .. } => "replace-nth",
            Operation::InsertIntoList { .. } => "insert-into-list",
        }
    }
}

fn default_open() -> String {
    "{".to_string()
}

fn default_close() -> String {
    "}".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyStepList,
    MissingField {
        step_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        step_id: String,
    },
    InvalidPattern {
        step_id: Option<String>,
        message: String,
    },
    InvalidCombo {
        step_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyStepList => write!(f, "recipe contains no steps"),
            ValidationIssue::MissingField { step_id, field } => match step_id {
                Some(id) => write!(f, "step '{id}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { step_id } => {
                write!(f, "step id '{step_id}' is used more than once")
            }
            ValidationIssue::InvalidPattern { step_id, message } => match step_id {
                Some(id) => write!(f, "step '{id}' has an invalid pattern: {message}"),
                None => write!(f, "invalid pattern: {message}"),
            },
            ValidationIssue::InvalidCombo { step_id, message } => match step_id {
                Some(id) => write!(f, "step '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid recipe configuration: {message}"),
            },
        }
    }
}
