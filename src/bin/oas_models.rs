//! Model Engine CLI
//!
//! Runs the model engine over an OpenAPI document (or a directory of JSON
//! schema files) and prints the resulting report as JSON.
//!
//! Usage:
//!   oas-models models petstore.json --output build/models.json
//!   oas-models diagnostics petstore.json --text
//!   oas-models config init

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use oas_model_engine::config::OutputFormat;
use oas_model_engine::graph::DiagnosticItem;
use oas_model_engine::{load_document, Engine, EngineConfig, SchemaDocument};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oas-models")]
#[command(about = "Resolve OpenAPI schemas into template-ready models")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve every schema and print the full generation report
    Models {
        /// OpenAPI JSON document or directory of schema files
        input: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the alias table
    Aliases {
        input: PathBuf,
    },

    /// Print diagnostics; exits non-zero when any error was found
    Diagnostics {
        input: PathBuf,

        /// Also fail on warnings
        #[arg(long)]
        strict: bool,

        /// Human-readable listing instead of JSON
        #[arg(long)]
        text: bool,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration
    Init {
        #[arg(default_value = "oas-models.toml")]
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = EngineConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.compact {
        config.output.format = OutputFormat::Compact;
    }

    match cli.command {
        Command::Models { input, output } => {
            let document = load(&input, &config)?;
            let report = Engine::new(config.generator.clone()).run(&document);

            eprintln!(
                "📊 {} models, {} failures, {} operations, {} diagnostics",
                report.models.len(),
                report.failures.len(),
                report.operations.len(),
                report.diagnostics.len()
            );

            let target = output.or_else(|| config.output.path.clone());
            emit(&report, config.output.format, target.as_deref())?;
            Ok(0)
        }

        Command::Aliases { input } => {
            let document = load(&input, &config)?;
            let engine = Engine::new(config.generator.clone());
            let ctx = engine.context(&document);
            emit(ctx.aliases(), config.output.format, None)?;
            Ok(0)
        }

        Command::Diagnostics { input, strict, text } => {
            let document = load(&input, &config)?;
            let report = Engine::new(config.generator.clone()).run(&document);
            if text {
                print!("{}", report.diagnostics);
            } else {
                let items: Vec<&DiagnosticItem> = report.diagnostics.all().iter().collect();
                emit(&items, config.output.format, None)?;
            }

            let errors = report.diagnostics.error_count();
            let warnings = report.diagnostics.warning_count();
            if errors > 0 || (strict && warnings > 0) {
                eprintln!("❌ {} error(s), {} warning(s)", errors, warnings);
                return Ok(1);
            }
            eprintln!("✅ {} warning(s), no errors", warnings);
            Ok(0)
        }

        Command::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", config.to_toml().context("Failed to render configuration")?);
                Ok(0)
            }
            ConfigAction::Init { path, force } => {
                if Path::new(&path).exists() && !force {
                    anyhow::bail!("{} already exists (use --force to overwrite)", path);
                }
                EngineConfig::default()
                    .save(&path)
                    .with_context(|| format!("Failed to write {}", path))?;
                eprintln!("✅ Wrote default configuration to {}", path);
                Ok(0)
            }
        },
    }
}

fn load(input: &Path, config: &EngineConfig) -> anyhow::Result<SchemaDocument> {
    let document = load_document(input, &config.input.load_config())?;
    tracing::info!(
        schemas = document.schema_count(),
        operations = document.operations().len(),
        input = %input.display(),
        "Loaded document"
    );
    Ok(document)
}

fn emit<T: Serialize + ?Sized>(value: &T, format: OutputFormat, target: Option<&Path>) -> anyhow::Result<()> {
    let rendered = format.render(value).context("Failed to serialize output")?;
    match target {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✅ Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
