//! metaqual: rubric-based metadata quality scoring
//!
//! Scores every record of a catalog collection against a weighted rubric of
//! mandatory-field rules and reports the aggregate.

#![allow(clippy::struct_excessive_bools, clippy::needless_pass_by_value)]

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use metaqual::{
    cli::{self, RubricShowFormat},
    config::{self, AppConfig, ConfigPreset, ScoreRunConfig},
    error::OptionContext,
    pipeline::exit_codes,
    reports::ReportFormat,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nRecord Inputs:",
        "\n  JSON Lines (one object per line), JSON array of objects",
        "\n\nRubric Formats:",
        "\n  YAML, JSON",
        "\n\nOutput Formats:",
        "\n  summary, table, json, csv, markdown"
    )
}

#[derive(Parser)]
#[command(name = "metaqual")]
#[command(version, long_version = build_long_version())]
#[command(about = "Rubric-based metadata quality scoring", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Mean score below --min-score
    2  Unscoreable records found (with --fail-on-unscoreable)
    3  Error occurred

EXAMPLES:
    # Summarize a collection
    metaqual score maps.jsonl --rubric rubrics/min-mandatory.yaml

    # CI gate on the mean score
    metaqual score maps.jsonl -r rubric.yaml --min-score 80 --fail-on-unscoreable

    # Per-record spreadsheet export
    metaqual score maps.jsonl -r rubric.yaml -o csv -O maps.csv

    # Check a rubric before using it
    metaqual rubric validate rubric.yaml")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "METAQUAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `score` subcommand
#[derive(Parser)]
struct ScoreArgs {
    /// Record file (JSON Lines or a JSON array of objects)
    records: PathBuf,

    /// Rubric file (YAML or JSON); falls back to `scoring.rubric` in the config file
    #[arg(short, long)]
    rubric: Option<PathBuf>,

    /// Collection identifier (defaults to the record file's stem)
    #[arg(short, long)]
    collection: Option<String>,

    /// Output format
    #[arg(short, long)]
    output: Option<ReportFormat>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Exit with code 1 if the mean score percentage is below this value (0-100)
    #[arg(long, value_name = "PERCENT")]
    min_score: Option<f32>,

    /// Exit with code 2 if any record could not be scored
    #[arg(long)]
    fail_on_unscoreable: bool,

    /// Report an empty collection instead of failing
    #[arg(long)]
    allow_empty: bool,

    /// Score records on a single thread
    #[arg(long)]
    sequential: bool,

    /// Number of histogram buckets in the score distribution
    #[arg(long, value_name = "N")]
    buckets: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a record collection against a rubric
    Score(ScoreArgs),

    /// Inspect or validate rubric files
    Rubric {
        #[command(subcommand)]
        action: RubricAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `rubric` command
#[derive(Subcommand)]
enum RubricAction {
    /// Load and compile a rubric, reporting the first problem found
    Validate {
        /// Rubric file
        path: PathBuf,
    },
    /// Print the compiled rules of a rubric
    Show {
        /// Rubric file
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: RubricShowFormat,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .metaqual.yaml in the current directory
    Init {
        /// Start from a preset (default, ci, audit)
        #[arg(long)]
        preset: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::ERROR
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Score(args) => {
            let overrides = AppConfig::builder()
                .parallel(!args.sequential)
                .allow_empty(args.allow_empty)
                .histogram_buckets(
                    args.buckets
                        .unwrap_or(metaqual::quality::DEFAULT_HISTOGRAM_BUCKETS),
                )
                .output_format(args.output.unwrap_or_default())
                .output_file(args.output_file)
                .no_color(cli.no_color)
                .min_score(args.min_score)
                .fail_on_unscoreable(args.fail_on_unscoreable)
                .quiet(cli.quiet);
            let overrides = match args.rubric {
                Some(path) => overrides.rubric(path),
                None => overrides,
            }
            .build();

            let (app_config, loaded_from) =
                AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides);
            if let Some(path) = &loaded_from {
                tracing::debug!("Using config file {}", path.display());
            }

            let rubric = app_config.scoring.rubric.clone().context_none(
                "No rubric given. Pass --rubric or set scoring.rubric in a config file.",
            )?;

            let config = ScoreRunConfig {
                records: args.records,
                rubric,
                collection: args.collection,
                scoring: app_config.scoring,
                aggregation: app_config.aggregation,
                output: app_config.output,
                behavior: app_config.behavior,
            };
            cli::run_score(config)
        }

        Commands::Rubric { action } => match action {
            RubricAction::Validate { path } => cli::run_rubric_validate(&path, cli.quiet),
            RubricAction::Show { path, format } => cli::run_rubric_show(&path, format, cli.quiet),
        },

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "metaqual", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = config::generate_json_schema().context("failed to build schema")?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => {
                    println!("{schema}");
                }
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (config, loaded_from) = config::load_or_default(cli.config.as_deref());
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Path => {
                let search_paths: [Option<String>; 3] = [
                    std::env::current_dir()
                        .ok()
                        .map(|p| p.display().to_string()),
                    config::user_config_dir().map(|p| p.display().to_string()),
                    dirs::home_dir().map(|p| p.display().to_string()),
                ];
                eprintln!("Config file search paths (in order):");
                for path in search_paths.into_iter().flatten() {
                    eprintln!("  {path}");
                }
                eprintln!();
                eprintln!("Recognized file names:");
                for name in &[
                    ".metaqual.yaml",
                    ".metaqual.yml",
                    "metaqual.yaml",
                    "metaqual.yml",
                ] {
                    eprintln!("  {name}");
                }
                eprintln!();
                match config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Init { preset } => {
                let preset = match preset.as_deref() {
                    None => ConfigPreset::Default,
                    Some(name) => ConfigPreset::from_name(name).with_context(|| {
                        let known: Vec<&str> =
                            ConfigPreset::all().iter().map(ConfigPreset::name).collect();
                        format!("unknown preset '{name}' (expected one of: {})", known.join(", "))
                    })?,
                };
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".metaqual.yaml");
                if target.exists() {
                    bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                let content = config::generate_example_config(&AppConfig::from_preset(preset));
                std::fs::write(&target, content)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {} ({preset} preset)", target.display());
                Ok(exit_codes::SUCCESS)
            }
        },
    }
}
