//! crashtally CLI - Command-line interface
//!
//! Usage:
//!   crashtally tally <vocabulary> [files...]
//!   crashtally all [files...] --output-dir <dir>
//!   crashtally vocabularies

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use crashtally_core::config::AppConfig;
use crashtally_core::{TallyReport, Vocabulary};
use crashtally_extractor::{CategoryExtractor, ExtractionOutput, ExtractionRun, VocabularyRegistry};
use crashtally_parser::ParserRegistry;

#[derive(Parser)]
#[command(name = "crashtally")]
#[command(about = "Condition-code tallies from accident-report exports")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tally one vocabulary across input files
    Tally {
        /// Vocabulary name (see `crashtally vocabularies`)
        vocabulary: String,
        /// Input files; defaults to the configured file list
        files: Vec<PathBuf>,
        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Codes)]
        format: OutputFormat,
        /// Order codes by descending count
        #[arg(long)]
        sort_desc: bool,
        /// Also group counts by the year found in this date field
        #[arg(long, value_name = "FIELD")]
        by_year: Option<String>,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
        /// Exit with an error when no input could be loaded
        #[arg(long)]
        fail_on_empty: bool,
    },
    /// Tally every vocabulary, one document per vocabulary
    All {
        /// Input files; defaults to the configured file list
        files: Vec<PathBuf>,
        /// Directory for `<name>-condition-data.json` files
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        compact: bool,
        #[arg(long)]
        fail_on_empty: bool,
    },
    /// List known vocabularies
    Vocabularies,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full document with per-code entries
    Codes,
    /// `{labels, values}` series
    Chart,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config);

    run(cli.command, &config)
}

fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    let vocabularies = VocabularyRegistry::builtin()?.with_overrides(
        config
            .build_vocabularies()
            .context("Invalid vocabulary in configuration")?,
    );
    let parsers = ParserRegistry::with_defaults();

    match command {
        Commands::Tally {
            vocabulary,
            files,
            output,
            format,
            sort_desc,
            by_year,
            compact,
            fail_on_empty,
        } => {
            let vocabulary = vocabularies.get(&vocabulary)?;
            let files = resolve_files(files, config);
            let result = run_vocabulary(vocabulary, &parsers, &files, by_year.as_deref());
            check_loaded(&result, fail_on_empty)?;

            let mut report = result.report;
            if sort_desc {
                report = report.sorted_by_count();
            }
            let pretty = config.output.pretty && !compact;
            let document = match format {
                OutputFormat::Codes => report.to_json(pretty)?,
                OutputFormat::Chart => report.chart_series().to_json(pretty)?,
            };
            emit(&document, output.as_deref())?;
        }
        Commands::All {
            files,
            output_dir,
            compact,
            fail_on_empty,
        } => {
            let files = resolve_files(files, config);
            let output_dir = output_dir.unwrap_or_else(|| config.output.output_dir.clone());
            fs::create_dir_all(&output_dir).with_context(|| {
                format!("Failed to create output directory {}", output_dir.display())
            })?;

            let pretty = config.output.pretty && !compact;
            for vocabulary in vocabularies.iter() {
                let result = run_vocabulary(vocabulary, &parsers, &files, None);
                check_loaded(&result, fail_on_empty)?;

                let path = output_dir.join(format!("{}-condition-data.json", vocabulary.name()));
                result
                    .report
                    .write_to(&path, pretty)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {}", path.display());
            }
        }
        Commands::Vocabularies => {
            for vocabulary in vocabularies.iter() {
                print_vocabulary(vocabulary);
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.as_str().into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_files(files: Vec<PathBuf>, config: &AppConfig) -> Vec<PathBuf> {
    if files.is_empty() {
        config.input_paths()
    } else {
        files
    }
}

fn run_vocabulary(
    vocabulary: &Vocabulary,
    parsers: &ParserRegistry,
    files: &[PathBuf],
    by_year: Option<&str>,
) -> ExtractionOutput {
    let extractor = CategoryExtractor::new(vocabulary.clone());
    let mut run = ExtractionRun::new(&extractor);
    if let Some(field) = by_year {
        run = run.with_years(field);
    }
    run.add_paths(parsers, files);

    let result = run.finish();
    log_summary(&result.report);
    result
}

fn check_loaded(result: &ExtractionOutput, fail_on_empty: bool) -> anyhow::Result<()> {
    if fail_on_empty && (result.sources.is_empty() || result.all_sources_failed()) {
        bail!(
            "No input could be loaded for vocabulary '{}'",
            result.report.vocabulary
        );
    }
    Ok(())
}

fn log_summary(report: &TallyReport) {
    info!(
        "{} ({}): {} records, {} counted",
        report.vocabulary,
        report.field,
        report.total_records,
        report.total_count()
    );
    for entry in &report.codes {
        info!("  {} ({}): {}", entry.code, entry.label, entry.count);
    }
}

fn emit(document: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, format!("{document}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{document}"),
    }
    Ok(())
}

fn print_vocabulary(vocabulary: &Vocabulary) {
    let fallback = vocabulary
        .fallback_code()
        .map(|code| format!(", fallback {code}"))
        .unwrap_or_default();
    println!("{} (field: {}{})", vocabulary.name(), vocabulary.field(), fallback);
    for category in vocabulary.categories() {
        match &category.color {
            Some(color) => println!("  {:<22} {} [{}]", category.code, category.label, color),
            None => println!("  {:<22} {}", category.code, category.label),
        }
    }
}
