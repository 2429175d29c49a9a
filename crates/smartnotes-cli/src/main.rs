//! SmartNotes CLI - Command-line interface
//!
//! Usage:
//!   smartnotes extract <path> [--summary]
//!   smartnotes evaluate <dataset-dir>
//!   smartnotes patterns

mod dataset;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use smartnotes_core::{AppConfig, Document, LoggingConfig, Profile};
use smartnotes_extractor::{AggregateMetrics, Evaluator, NoteStructurer};

#[derive(Parser)]
#[command(name = "smartnotes")]
#[command(about = "Extract terms, definitions and relationships from study notes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Built-in rule profile (unified, general, history)
    #[arg(long)]
    profile: Option<Profile>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Structure a single note and print it as JSON
    Extract {
        /// Path to the note
        path: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Include key concepts, examples, note type and word count
        #[arg(long)]
        summary: bool,
    },
    /// Score extraction against an annotated dataset
    Evaluate {
        /// Directory containing notes/ and annotations/
        dataset: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        /// Print metrics as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
    /// List the active rules in priority order
    Patterns {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

impl Commands {
    fn engine(&self) -> &EngineArgs {
        match self {
            Self::Extract { engine, .. }
            | Self::Evaluate { engine, .. }
            | Self::Patterns { engine } => engine,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.command.engine())?;
    init_tracing(&config.logging);

    let structurer = NoteStructurer::new(&config.engine).context("Failed to build pattern catalog")?;

    match cli.command {
        Commands::Extract {
            path,
            pretty,
            summary,
            ..
        } => extract(&structurer, &path, pretty, summary).await,
        Commands::Evaluate { dataset, json, .. } => evaluate(structurer, &dataset, json).await,
        Commands::Patterns { .. } => {
            patterns(&structurer);
            Ok(())
        }
    }
}

/// Defaults, then the config file, then environment, then flags
fn load_config(args: &EngineArgs) -> Result<AppConfig> {
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    let mut config = config.with_env_override()?;

    if let Some(profile) = args.profile {
        config.engine.profile = profile;
    }
    Ok(config)
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn extract(
    structurer: &NoteStructurer,
    path: &Path,
    pretty: bool,
    summary: bool,
) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let document = Document::new(id, text);
    let json = if summary {
        to_json(&structurer.summarize(&document), pretty)?
    } else {
        to_json(&structurer.structure(&document), pretty)?
    };
    println!("{json}");
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

async fn evaluate(structurer: NoteStructurer, dir: &Path, json: bool) -> Result<()> {
    let samples = dataset::load_dataset(dir).await?;
    if samples.is_empty() {
        anyhow::bail!("No annotated notes found in {}", dir.display());
    }

    let structurer = Arc::new(structurer);
    let tasks = samples.into_iter().map(|sample| {
        let structurer = Arc::clone(&structurer);
        tokio::task::spawn_blocking(move || {
            let summary = structurer.summarize(&sample.document);
            (sample, summary)
        })
    });
    let results = futures::future::try_join_all(tasks)
        .await
        .context("Structuring task failed")?;

    let evaluator = Evaluator::new();
    let mut overall = AggregateMetrics::default();
    let mut by_domain: BTreeMap<String, AggregateMetrics> = BTreeMap::new();

    for (sample, summary) in &results {
        let terms = &summary.note.terms;
        let metrics = evaluator.evaluate_terms(terms, &sample.gold);
        tracing::debug!(
            note = %sample.document.id,
            precision = metrics.precision(),
            recall = metrics.recall(),
            f1 = metrics.f1_score(),
            "note evaluated"
        );
        overall.add_document(&metrics, terms);
        let domain = by_domain.entry(sample.domain().to_string()).or_default();
        domain.add_document(&metrics, terms);

        if !sample.concepts.is_empty() {
            let concepts = evaluator.evaluate_concepts(&summary.concepts, &sample.concepts);
            tracing::debug!(
                note = %sample.document.id,
                concept_f1 = concepts.f1_score(),
                "concepts evaluated"
            );
            overall.add_concepts(&concepts);
            domain.add_concepts(&concepts);
        }
    }

    if json {
        let domains: BTreeMap<&str, f32> = by_domain
            .iter()
            .map(|(domain, m)| (domain.as_str(), m.macro_f1()))
            .collect();
        let concepts = (overall.concept_documents > 0).then(|| {
            serde_json::json!({
                "documents": overall.concept_documents,
                "precision": overall.concepts.precision(),
                "recall": overall.concepts.recall(),
                "mean_f1": overall.concept_macro_f1(),
            })
        });
        let summary = serde_json::json!({
            "documents": overall.num_documents,
            "precision": overall.totals.precision(),
            "recall": overall.totals.recall(),
            "f1": overall.totals.f1_score(),
            "macro_f1": overall.macro_f1(),
            "domains": domains,
            "concepts": concepts,
            "pattern_usage": overall.pattern_usage,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", overall.report());
        println!("\nPer-domain macro F1:");
        for (domain, metrics) in &by_domain {
            let concepts = if metrics.concept_documents > 0 {
                format!(", concepts {:.1}%", metrics.concept_macro_f1() * 100.0)
            } else {
                String::new()
            };
            println!(
                "  {domain:<12} {:.1}% ({} notes{concepts})",
                metrics.macro_f1() * 100.0,
                metrics.num_documents
            );
        }
    }

    Ok(())
}

fn patterns(structurer: &NoteStructurer) {
    for rule in structurer.catalog().rules() {
        let def = rule.def();
        println!(
            "{:>3}  {:<24} min_def={:<3} terms={:?}",
            rule.priority(),
            rule.tag(),
            def.min_definition_len,
            def.term_case
        );
    }
}
