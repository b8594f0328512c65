use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use text_patcher::config::{
    apply_recipe, load_from_path, resolve_target, ApplicationError, ApplyOptions, StepResult,
};
use text_patcher::{
    backup_path_for, closest_lines, find_lines, find_lines_with_context,
    insert_into_delimited_list, insert_into_delimited_list_after, substitute_all,
    substitute_first, substitute_nth, write_with_backup_to, Document, LineBlock, PatchError,
    Pattern, DEFAULT_BACKUP_SUFFIX,
};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const BACKUP_SUFFIX_ENV: &str = "TEXT_PATCHER_BACKUP_SUFFIX";

#[derive(Parser)]
#[command(name = "text-patcher")]
#[command(about = "Search and patch a single source file", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WriteFlags {
    /// Show what would change without writing anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Suffix for the sibling backup file (default: .bak)
    #[arg(long)]
    backup_suffix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the lines a pattern matches (read-only)
    Find {
        /// File to search
        file: PathBuf,

        /// Literal text, or a regex with --regex
        pattern: String,

        /// Treat the pattern as a regular expression
        #[arg(short, long)]
        regex: bool,

        /// Lines of context around each match
        #[arg(short = 'C', long, default_value_t = 0)]
        context: usize,

        /// Emit matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the first, n-th or every match of a pattern
    Replace {
        /// File to patch
        file: PathBuf,

        /// Literal text, or a regex with --regex
        pattern: String,

        /// Replacement text; regex replacements may use $1, ${name}
        replacement: String,

        /// Treat the pattern as a regular expression
        #[arg(short, long)]
        regex: bool,

        /// Replace every match
        #[arg(short, long, conflicts_with = "nth")]
        all: bool,

        /// Replace only the n-th match (zero-based)
        #[arg(long)]
        nth: Option<usize>,

        #[command(flatten)]
        write: WriteFlags,
    },

    /// Append items to the first delimited list, e.g. an import clause
    AddToList {
        /// File to patch
        file: PathBuf,

        /// Items to append
        #[arg(required = true)]
        items: Vec<String>,

        /// Opening delimiter
        #[arg(long, default_value = "{")]
        open: String,

        /// Closing delimiter
        #[arg(long, default_value = "}")]
        close: String,

        /// Start looking for the list at the first match of this pattern
        #[arg(long)]
        anchor: Option<String>,

        /// Treat the anchor as a regular expression
        #[arg(short, long, requires = "anchor")]
        regex: bool,

        /// Append items even if already present in the list
        #[arg(long)]
        allow_duplicates: bool,

        #[command(flatten)]
        write: WriteFlags,
    },

    /// Apply a TOML recipe, or every recipe in a directory
    Apply {
        /// Recipe file or directory of recipes
        recipes: PathBuf,

        /// Patch this file instead of the recipe's meta.target
        #[arg(short, long)]
        target: Option<PathBuf>,

        #[command(flatten)]
        write: WriteFlags,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Find {
            file,
            pattern,
            regex,
            context,
            json,
        } => cmd_find(&file, &pattern, regex, context, json),

        Commands::Replace {
            file,
            pattern,
            replacement,
            regex,
            all,
            nth,
            write,
        } => cmd_replace(&file, &pattern, &replacement, regex, all, nth, &write),

        Commands::AddToList {
            file,
            items,
            open,
            close,
            anchor,
            regex,
            allow_duplicates,
            write,
        } => cmd_add_to_list(
            &file,
            &items,
            &open,
            &close,
            anchor.as_deref(),
            regex,
            !allow_duplicates,
            &write,
        ),

        Commands::Apply {
            recipes,
            target,
            write,
        } => cmd_apply(&recipes, target.as_deref(), &write),
    }
}

/// Logs go to stderr so stdout stays clean for reports and JSON.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Backup suffix priority: flag, then recipe, then environment, then default.
///
/// A blank suffix would make the backup path the target itself.
fn backup_suffix(flag: Option<&str>, recipe: Option<&str>) -> Result<String> {
    let suffix = flag
        .or(recipe)
        .map(str::to_string)
        .or_else(|| env::var(BACKUP_SUFFIX_ENV).ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| DEFAULT_BACKUP_SUFFIX.to_string());
    if suffix.trim().is_empty() {
        anyhow::bail!("backup suffix {:?} must contain a visible character", suffix);
    }
    Ok(suffix)
}

/// Helper: Discover recipe files.
///
/// A file is used as-is; a directory is scanned one level deep for `.toml`
/// files, in sorted order.
fn discover_recipes(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).max_depth(1) {
        let entry = entry.with_context(|| format!("cannot scan {}", path.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No .toml recipes found in {}", path.display());
    }
    Ok(files)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
    if !modified.ends_with('\n') {
        println!();
    }
}

fn load(file: &Path) -> Result<Document> {
    Document::load(file).with_context(|| format!("cannot load {}", file.display()))
}

/// Shared tail of every mutating command: diff, then write behind a backup.
fn finish_write(file: &Path, before: &Document, after: &Document, flags: &WriteFlags) -> Result<()> {
    let backup = backup_path_for(file, &backup_suffix(flags.backup_suffix.as_deref(), None)?);

    if before == after {
        println!("{} {}: nothing to change", "⊙".yellow(), file.display());
        return Ok(());
    }

    if flags.diff || flags.dry_run {
        display_diff(file, before.as_str(), after.as_str());
    }

    if flags.dry_run {
        println!("{}", "[DRY RUN - no files written]".cyan());
        return Ok(());
    }

    let outcome = write_with_backup_to(file, &backup, after.as_str())
        .with_context(|| format!("cannot write {}", file.display()))?;
    println!(
        "{} Wrote {} (backup: {})",
        "✓".green(),
        outcome.target.display(),
        outcome.backup.display()
    );
    Ok(())
}

fn print_block(block: &LineBlock<'_>) {
    for (index, line) in block.numbered() {
        if index == block.matched {
            println!("{}: {}", format!("{index:>5}").green().bold(), line);
        } else {
            println!("{}: {}", format!("{index:>5}").dimmed(), line.dimmed());
        }
    }
    println!("{}", "--".dimmed());
}

fn cmd_find(file: &Path, pattern: &str, regex: bool, context: usize, json: bool) -> Result<()> {
    let doc = load(file)?;
    let pattern = Pattern::parse(pattern, regex)?;

    if json {
        let value = if context == 0 {
            serde_json::to_value(find_lines(&doc, &pattern).collect::<Vec<_>>())?
        } else {
            serde_json::to_value(find_lines_with_context(&doc, &pattern, context).collect::<Vec<_>>())?
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mut found = 0;
    if context == 0 {
        for hit in find_lines(&doc, &pattern) {
            println!("{}: {}", format!("{:>5}", hit.index).green(), hit.text);
            found += 1;
        }
    } else {
        for block in find_lines_with_context(&doc, &pattern, context) {
            print_block(&block);
            found += 1;
        }
    }

    if found > 0 {
        println!("{}", format!("{found} matching line(s) in {}", file.display()).bold());
        return Ok(());
    }

    println!("{} No lines match {}", "⊘".cyan(), pattern);
    if !pattern.is_regex() {
        let suggestions = closest_lines(&doc, pattern.as_str(), 3);
        if !suggestions.is_empty() {
            println!("{}", "Closest lines:".bold());
            for s in suggestions {
                println!(
                    "  {}: {} {}",
                    format!("{:>5}", s.index).yellow(),
                    s.text.trim(),
                    format!("({:.0}%)", s.score * 100.0).dimmed()
                );
            }
        }
    }
    Ok(())
}

fn cmd_replace(
    file: &Path,
    pattern: &str,
    replacement: &str,
    regex: bool,
    all: bool,
    nth: Option<usize>,
    flags: &WriteFlags,
) -> Result<()> {
    let doc = load(file)?;
    let pattern = Pattern::parse(pattern, regex)?;

    let result = match (all, nth) {
        (true, _) => substitute_all(&doc, &pattern, replacement)?,
        (false, Some(n)) => substitute_nth(&doc, &pattern, replacement, n)?,
        (false, None) => substitute_first(&doc, &pattern, replacement)?,
    };

    if !result.matched() {
        println!("{} No match for {} in {}", "⊘".cyan(), pattern, file.display());
        return Ok(());
    }

    println!(
        "{} Replaced {} occurrence(s) of {}",
        "✓".green(),
        result.count,
        pattern
    );
    finish_write(file, &doc, &result.document, flags)
}

#[allow(clippy::too_many_arguments)]
fn cmd_add_to_list(
    file: &Path,
    items: &[String],
    open: &str,
    close: &str,
    anchor: Option<&str>,
    regex: bool,
    skip_if_present: bool,
    flags: &WriteFlags,
) -> Result<()> {
    let doc = load(file)?;

    let result = match anchor {
        Some(anchor) => {
            let anchor = Pattern::parse(anchor, regex)?;
            insert_into_delimited_list_after(&doc, &anchor, open, close, items, skip_if_present)
        }
        None => insert_into_delimited_list(&doc, open, close, items, skip_if_present),
    };

    let insertion = match result {
        Ok(insertion) => insertion,
        Err(PatchError::PatternNotFound { anchor }) => {
            eprintln!("{} {}", "✗".red(), "CONFLICT: list not found".red());
            eprintln!("  File: {}", file.display());
            eprintln!("  Expected: {}", anchor);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if insertion.changed() {
        println!(
            "{} Added {}",
            "✓".green(),
            insertion.inserted.join(", ")
        );
    }
    finish_write(file, &doc, &insertion.document, flags)
}

fn cmd_apply(recipes: &Path, target_override: Option<&Path>, flags: &WriteFlags) -> Result<()> {
    let recipe_files = discover_recipes(recipes)?;

    let mut total_applied = 0;
    let mut total_unchanged = 0;
    let mut total_failed = 0;

    for recipe_file in recipe_files {
        println!("Loading recipe {}...", recipe_file.display());

        let recipe = load_from_path(&recipe_file)?;
        let target = resolve_target(&recipe, recipe_file.parent(), target_override)?;
        let options = ApplyOptions {
            backup_suffix: Some(backup_suffix(
                flags.backup_suffix.as_deref(),
                recipe.meta.backup_suffix.as_deref(),
            )?),
            dry_run: flags.dry_run,
        };

        if flags.dry_run {
            println!("{}", "  [DRY RUN - showing what would be applied]".cyan());
        }

        let report = match apply_recipe(&recipe, &target, &options) {
            Ok(report) => report,
            Err(ApplicationError::Document(e)) => {
                eprintln!("{} {}: {}", "✗".red(), target.display(), e);
                total_failed += recipe.steps.len();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        for (step_id, result) in &report.steps {
            match result {
                Ok(StepResult::Applied { count }) => {
                    println!("{} {}: {} change(s)", "✓".green(), step_id, count);
                    total_applied += 1;
                }
                Ok(StepResult::Unchanged { reason }) => {
                    println!("{} {}: Unchanged ({})", "⊙".yellow(), step_id, reason);
                    total_unchanged += 1;
                }
                Err(e) => {
                    eprintln!("{} {}: Error - {}", "✗".red(), step_id, e);
                    if let PatchError::PatternNotFound { anchor } = e {
                        eprintln!("  {}", "CONFLICT: expected anchor is missing".red());
                        eprintln!("  File: {}", report.target.display());
                        eprintln!("  Anchor: {}", anchor);
                    }
                    total_failed += 1;
                }
            }
        }

        if report.changed() && (flags.diff || flags.dry_run) {
            display_diff(&report.target, &report.original, &report.patched);
        }

        match &report.written {
            Some(outcome) => println!(
                "  Wrote {} (backup: {})",
                outcome.target.display(),
                outcome.backup.display()
            ),
            None if report.failed() > 0 => {
                println!("{}", "  Not written: a step failed".yellow())
            }
            None => {}
        }

        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", total_applied).green());
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
