//! Tally CLI - manage variables and formulas, evaluate formulas

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tally::prelude::*;
use tally::{canonical_name, context_placeholders, FormulaId, VariableId, DEFAULT_MAX_DEPTH};
use tracing::debug;

#[derive(Parser)]
#[command(name = "tally")]
#[command(
    author,
    version,
    about = "Define variables and formulas, then evaluate formulas"
)]
struct Cli {
    /// Catalog file holding variables and formulas
    #[arg(
        short,
        long,
        global = true,
        env = "TALLY_FILE",
        default_value = "tally.json"
    )]
    file: PathBuf,

    /// Log evaluation steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Longest dependency chain allowed between variables
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage variables
    #[command(subcommand, alias = "variable")]
    Var(VarCommand),

    /// Manage formulas
    #[command(subcommand)]
    Formula(FormulaCommand),

    /// Evaluate a stored formula, asking for any contextual values not given
    Eval {
        /// Formula name
        formula: String,

        /// Contextual value, e.g. `--set num_of_days=20`
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Evaluate an expression against the stored variables
    Calc {
        /// Expression, e.g. `BASIC*0.2`
        expression: String,

        /// Contextual value, e.g. `--set num_of_days=20`
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum VarCommand {
    /// Add a variable
    Add {
        /// Variable name (stored uppercase)
        name: String,

        /// Value or expression
        expression: String,

        /// The expression references other variables
        #[arg(short, long)]
        dynamic: bool,
    },

    /// Replace a variable, keeping its id
    Set {
        /// Variable id
        id: String,

        /// Variable name (stored uppercase)
        name: String,

        /// Value or expression
        expression: String,

        /// The expression references other variables
        #[arg(short, long)]
        dynamic: bool,
    },

    /// Delete a variable
    #[command(alias = "delete")]
    Rm {
        /// Variable id
        id: String,
    },

    /// List variables with their resolved values
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
enum FormulaCommand {
    /// Add a formula
    Add {
        /// Formula name (stored uppercase)
        name: String,

        /// Expression, may use `{{#name}}` contextual placeholders
        expression: String,
    },

    /// Replace a formula, keeping its id
    Set {
        /// Formula id
        id: String,

        /// Formula name (stored uppercase)
        name: String,

        /// Expression, may use `{{#name}}` contextual placeholders
        expression: String,
    },

    /// Delete a formula
    #[command(alias = "delete")]
    Rm {
        /// Formula id
        id: String,
    },

    /// List formulas
    #[command(alias = "ls")]
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = EngineOptions {
        max_depth: cli.max_depth,
    };
    let path = cli.file.as_path();

    match cli.command {
        Commands::Var(command) => run_var(path, command, &options),
        Commands::Formula(command) => run_formula(path, command),
        Commands::Eval { formula, set } => {
            let stdin = io::stdin();
            eval_formula(
                path,
                &formula,
                set,
                &options,
                &mut stdin.lock(),
                &mut io::stderr(),
            )
        }
        Commands::Calc { expression, set } => calc(path, &expression, set, &options),
    }
}

/// Install a stderr subscriber for `--verbose` or `RUST_LOG`
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("tally=debug,tally_formula=debug,tally_cli=debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => return,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Parse `NAME=VALUE`
fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

// === Catalog file ===

/// Load the catalog, or start an empty one if the file does not exist
fn load_catalog(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        debug!(path = %path.display(), "catalog file not found, starting empty");
        return Ok(Catalog::new());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    if text.trim().is_empty() {
        return Ok(Catalog::new());
    }
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

fn save_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let mut text = serde_json::to_string_pretty(catalog).context("Failed to serialize catalog")?;
    text.push('\n');
    std::fs::write(path, text).with_context(|| format!("Failed to write '{}'", path.display()))
}

// === Variables ===

fn run_var(path: &Path, command: VarCommand, options: &EngineOptions) -> Result<()> {
    let mut catalog = load_catalog(path)?;

    match command {
        VarCommand::Add {
            name,
            expression,
            dynamic,
        } => {
            let id = catalog.add_variable(&name, kind_of(dynamic), &expression)?;
            save_catalog(path, &catalog)?;
            println!("Added variable {} ({})", canonical_name(&name), id);
        }
        VarCommand::Set {
            id,
            name,
            expression,
            dynamic,
        } => {
            let variable_id = VariableId::new(id.as_str());
            catalog.replace_variable(&variable_id, &name, kind_of(dynamic), &expression)?;
            save_catalog(path, &catalog)?;
            println!("Updated variable {} ({})", canonical_name(&name), id);
        }
        VarCommand::Rm { id } => {
            let removed = catalog.remove_variable(&VariableId::new(id.as_str()))?;
            let dependents = catalog.dependent_variables(&removed.name);
            save_catalog(path, &catalog)?;
            println!("Deleted variable {} ({})", removed.name, removed.id);
            if !dependents.is_empty() {
                eprintln!(
                    "Warning: {} still referenced by {}",
                    removed.name,
                    dependents.join(", ")
                );
            }
        }
        VarCommand::List => list_variables(&catalog, options),
    }

    Ok(())
}

fn kind_of(dynamic: bool) -> VariableKind {
    if dynamic {
        VariableKind::Dynamic
    } else {
        VariableKind::Constant
    }
}

fn list_variables(catalog: &Catalog, options: &EngineOptions) {
    if catalog.variables().is_empty() {
        println!("No variables defined yet.");
        return;
    }

    let values = match catalog.resolve_with_options(options) {
        Ok(values) => Some(values),
        Err(e) => {
            eprintln!("Warning: values unavailable: {}", e);
            None
        }
    };

    for variable in catalog.variables() {
        let value = values
            .as_ref()
            .and_then(|v| v.get(&variable.name))
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        println!(
            "{}\t{}\t{}\t{}\t= {}",
            variable.id, variable.name, variable.kind, variable.expression, value
        );
    }
}

// === Formulas ===

fn run_formula(path: &Path, command: FormulaCommand) -> Result<()> {
    let mut catalog = load_catalog(path)?;

    match command {
        FormulaCommand::Add { name, expression } => {
            check_references(&catalog, &expression)?;
            let id = catalog.add_formula(&name, &expression)?;
            save_catalog(path, &catalog)?;
            println!("Added formula {} ({})", canonical_name(&name), id);
        }
        FormulaCommand::Set {
            id,
            name,
            expression,
        } => {
            check_references(&catalog, &expression)?;
            catalog.replace_formula(&FormulaId::new(id.as_str()), &name, &expression)?;
            save_catalog(path, &catalog)?;
            println!("Updated formula {} ({})", canonical_name(&name), id);
        }
        FormulaCommand::Rm { id } => {
            let removed = catalog.remove_formula(&FormulaId::new(id.as_str()))?;
            save_catalog(path, &catalog)?;
            println!("Deleted formula {} ({})", removed.name, removed.id);
        }
        FormulaCommand::List => {
            if catalog.formulas().is_empty() {
                println!("No formulas defined yet.");
            }
            for formula in catalog.formulas() {
                println!("{}\t{}\t{}", formula.id, formula.name, formula.expression);
            }
        }
    }

    Ok(())
}

/// Reject formulas that use variables the catalog does not define
fn check_references(catalog: &Catalog, expression: &str) -> Result<()> {
    let undefined = catalog
        .undefined_references(expression)
        .context("Invalid formula expression")?;
    if !undefined.is_empty() {
        bail!("Formula uses undefined variables: {}", undefined.join(", "));
    }
    Ok(())
}

// === Evaluation ===

fn eval_formula(
    path: &Path,
    name: &str,
    set: Vec<(String, String)>,
    options: &EngineOptions,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<()> {
    let catalog = load_catalog(path)?;
    let formula = catalog
        .formula_by_name(name)
        .with_context(|| format!("Formula not found: {}", canonical_name(name)))?;

    let mut context: ContextValues = set.into_iter().collect();
    let placeholders = context_placeholders(&formula.expression);
    if !ask_missing(&placeholders, &mut context, input, prompt)? {
        eprintln!("Evaluation cancelled");
        return Ok(());
    }

    let result = catalog.evaluate_with_options(&formula.name, &context, options)?;
    println!("Result of {}: {}", formula.name, result);
    Ok(())
}

fn calc(
    path: &Path,
    expression: &str,
    set: Vec<(String, String)>,
    options: &EngineOptions,
) -> Result<()> {
    let catalog = load_catalog(path)?;
    let context: ContextValues = set.into_iter().collect();
    let result = catalog.evaluate_expression_with_options(expression, &context, options)?;
    println!("{}", result);
    Ok(())
}

/// Ask once for each placeholder that has no value yet
///
/// Returns `false` if input ends before every value was entered.
fn ask_missing(
    placeholders: &[String],
    context: &mut ContextValues,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<bool> {
    for name in placeholders {
        if context.contains(name) {
            continue;
        }

        write!(prompt, "Enter value for {}: ", name)?;
        prompt.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).context("Failed to read input")? == 0 {
            return Ok(false);
        }
        context.insert(name.as_str(), line.trim_end_matches(['\r', '\n']));
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("days=20").unwrap(),
            ("days".to_string(), "20".to_string())
        );
        assert_eq!(
            parse_assignment("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("days=").unwrap(),
            ("days".to_string(), String::new())
        );
        assert!(parse_assignment("days").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn test_ask_missing_prompts_once_per_name() {
        let placeholders = vec!["days".to_string(), "rate".to_string()];
        let mut context = ContextValues::new().with("rate", "2");
        let mut input = Cursor::new("20\n");
        let mut prompt = Vec::new();

        assert!(ask_missing(&placeholders, &mut context, &mut input, &mut prompt).unwrap());
        assert_eq!(String::from_utf8(prompt).unwrap(), "Enter value for days: ");
        assert_eq!(context.get("days"), Some("20"));
        assert_eq!(context.get("rate"), Some("2"));
    }

    #[test]
    fn test_ask_missing_cancelled_on_eof() {
        let placeholders = vec!["a".to_string(), "b".to_string()];
        let mut context = ContextValues::new();
        let mut input = Cursor::new("1\n");
        let mut prompt = Vec::new();

        assert!(!ask_missing(&placeholders, &mut context, &mut input, &mut prompt).unwrap());
        assert_eq!(context.get("a"), Some("1"));
        assert!(!context.contains("b"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = load_catalog(&dir.path().join("absent.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tally.json");

        let mut catalog = Catalog::new();
        catalog
            .add_variable("rate", VariableKind::Constant, "1.5")
            .unwrap();
        save_catalog(&path, &catalog).unwrap();

        let loaded = load_catalog(&path).unwrap();
        assert_eq!(loaded.variables(), catalog.variables());
    }
}
