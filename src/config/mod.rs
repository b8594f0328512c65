pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{
    apply_recipe, check_recipe, resolve_target, ApplicationError, ApplyOptions, RecipeReport,
    StepResult,
};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    Metadata, Operation, PatternSpec, Recipe, StepDefinition, ValidationError, ValidationIssue,
};
