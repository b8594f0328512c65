//! Recipe loading and application against files on disk.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use text_patcher::config::{
    apply_recipe, check_recipe, load_from_path, load_from_str, resolve_target, ApplyOptions,
    ConfigError, StepResult,
};
use text_patcher::PatchError;

const MODULE: &str = r#"import { Zap } from 'lucide-react';

export function AdvanceDeductionModule() {
  if (loading) {
    return (
      <Spinner />
    );
  }
  return (
    <div className="text-sm p-4">Advances</div>
  );
}
"#;

const RECIPE: &str = r#"[meta]
name = "advance-module-cleanup"
description = "Icons, spacing and the duplicated return"
target = "AdvanceDeductionModule.tsx"
backup_suffix = ".pre-cleanup"

[[steps]]
id = "icons"
[steps.operation]
type = "insert-into-list"
items = ["Clock", "AlertTriangle"]

[[steps]]
id = "spacing"
[steps.pattern]
type = "regex"
value = 'p-(\d)'
[steps.operation]
type = "replace-all"
text = "px-$1 py-2"

[[steps]]
id = "second-return"
[steps.pattern]
type = "literal"
value = "return ("
[steps.operation]
type = "replace-nth"
text = "return <>("
n = 1
"#;

/// Helper to create a temp dir with the component and its recipe
fn setup_test_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("AdvanceDeductionModule.tsx"), MODULE).unwrap();
    fs::write(dir.path().join("cleanup.toml"), RECIPE).unwrap();
    dir
}

fn step_result<'a>(
    steps: &'a [(String, Result<StepResult, PatchError>)],
    id: &str,
) -> &'a Result<StepResult, PatchError> {
    &steps.iter().find(|(step_id, _)| step_id == id).unwrap().1
}

#[test]
fn test_full_recipe_applies_and_backs_up() {
    let workspace = setup_test_workspace();
    let recipe_path = workspace.path().join("cleanup.toml");

    let recipe = load_from_path(&recipe_path).unwrap();
    let target = resolve_target(&recipe, recipe_path.parent(), None).unwrap();
    let report = apply_recipe(&recipe, &target, &ApplyOptions::default()).unwrap();

    assert_eq!(report.failed(), 0);
    assert_eq!(
        step_result(&report.steps, "icons").as_ref().unwrap(),
        &StepResult::Applied { count: 2 }
    );
    assert_eq!(
        step_result(&report.steps, "spacing").as_ref().unwrap(),
        &StepResult::Applied { count: 1 }
    );

    let patched = fs::read_to_string(&target).unwrap();
    assert!(patched.starts_with("import { Zap, Clock, AlertTriangle } from 'lucide-react';"));
    assert!(patched.contains(r#"className="text-sm px-4 py-2""#));
    assert!(patched.contains("    return (\n      <Spinner />"));
    assert!(patched.contains("  return <>(\n"));

    let backup = workspace.path().join("AdvanceDeductionModule.tsx.pre-cleanup");
    assert_eq!(report.written.unwrap().backup, backup);
    assert_eq!(fs::read_to_string(backup).unwrap(), MODULE);
}

#[test]
fn test_reapplying_reports_unchanged_for_list() {
    let workspace = setup_test_workspace();
    let recipe_path = workspace.path().join("cleanup.toml");
    let recipe = load_from_path(&recipe_path).unwrap();
    let target = resolve_target(&recipe, recipe_path.parent(), None).unwrap();

    apply_recipe(&recipe, &target, &ApplyOptions::default()).unwrap();
    let report = check_recipe(&recipe, &target).unwrap();

    assert!(matches!(
        step_result(&report.steps, "icons"),
        Ok(StepResult::Unchanged { .. })
    ));
    assert!(matches!(
        step_result(&report.steps, "spacing"),
        Ok(StepResult::Unchanged { .. })
    ));
}

#[test]
fn test_options_suffix_overrides_recipe() {
    let workspace = setup_test_workspace();
    let recipe_path = workspace.path().join("cleanup.toml");
    let recipe = load_from_path(&recipe_path).unwrap();
    let target = resolve_target(&recipe, recipe_path.parent(), None).unwrap();

    let options = ApplyOptions {
        backup_suffix: Some(".orig".to_string()),
        dry_run: false,
    };
    apply_recipe(&recipe, &target, &options).unwrap();

    assert!(workspace
        .path()
        .join("AdvanceDeductionModule.tsx.orig")
        .exists());
    assert!(!workspace
        .path()
        .join("AdvanceDeductionModule.tsx.pre-cleanup")
        .exists());
}

#[test]
fn test_dry_run_reports_without_writing() {
    let workspace = setup_test_workspace();
    let recipe_path = workspace.path().join("cleanup.toml");
    let recipe = load_from_path(&recipe_path).unwrap();
    let target = resolve_target(&recipe, recipe_path.parent(), None).unwrap();

    let options = ApplyOptions {
        dry_run: true,
        ..ApplyOptions::default()
    };
    let report = apply_recipe(&recipe, &target, &options).unwrap();

    assert!(report.changed());
    assert!(report.written.is_none());
    assert_eq!(fs::read_to_string(&target).unwrap(), MODULE);
}

#[test]
fn test_missing_target_file() {
    let workspace = setup_test_workspace();
    let recipe = load_from_str(RECIPE).unwrap();

    let err = apply_recipe(
        &recipe,
        &workspace.path().join("Missing.tsx"),
        &ApplyOptions::default(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("Missing.tsx"));
}

#[test]
fn test_invalid_recipe_reports_path() {
    let workspace = setup_test_workspace();
    let path = workspace.path().join("broken.toml");
    fs::write(
        &path,
        r#"[[steps]]
id = "bad-regex"
[steps.pattern]
type = "regex"
value = "(unclosed"
[steps.operation]
type = "replace-all"
text = "x"
"#,
    )
    .unwrap();

    let err = load_from_path(&path).unwrap_err();

    assert!(matches!(err, ConfigError::Validation { .. }));
    let message = err.to_string();
    assert!(message.contains("broken.toml"));
    assert!(message.contains("bad-regex"));
}

#[test]
fn test_target_resolves_against_recipe_dir() {
    let recipe = load_from_str(RECIPE).unwrap();

    let target = resolve_target(&recipe, Some(Path::new("/srv/app/patches")), None).unwrap();

    assert_eq!(
        target,
        Path::new("/srv/app/patches/AdvanceDeductionModule.tsx")
    );
}
