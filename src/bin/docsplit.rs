use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docsplit::{BatchConfig, BatchRunner, JsonPageSource, ManifestAssembler, RuleSet};

#[derive(Parser)]
#[command(name = "docsplit")]
#[command(about = "Classify scanned pages by rule and split documents into per-category groups")]
struct Args {
    /// Rule configuration (JSON object of category -> {"expression": ...})
    #[arg(short, long, default_value = "document_types.json")]
    rules: PathBuf,

    /// Directory holding `<document>.pages.json` files
    #[arg(short, long, default_value = "./input")]
    input: PathBuf,

    /// Directory for manifests
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Documents processed concurrently (default: available cores)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let dispatch = tracing::Dispatch::new(tracing_subscriber::fmt().with_env_filter(filter).finish());
    tracing::dispatcher::with_default(&dispatch, || run(&args, &dispatch))
}

fn run(args: &Args, dispatch: &tracing::Dispatch) -> Result<()> {
    let ruleset = RuleSet::from_file(&args.rules)
        .with_context(|| format!("loading rules from {}", args.rules.display()))?;
    tracing::info!(%ruleset, "rules loaded");
    for name in ruleset.unparseable_rules() {
        if let Some(error) = ruleset.parse_error_of(name) {
            tracing::warn!(rule = name, %error, "rule will never match");
        }
    }

    let documents = JsonPageSource::discover(&args.input)
        .with_context(|| format!("listing {}", args.input.display()))?;
    if documents.is_empty() {
        tracing::warn!(input = %args.input.display(), "no page data files found");
        return Ok(());
    }

    let mut config = BatchConfig::default();
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    let source = JsonPageSource::new();
    let assembler = ManifestAssembler::new(&args.output);
    let report = BatchRunner::new(&ruleset, &source, &assembler)
        .with_config(config)
        .with_dispatch(dispatch.clone())
        .run(&documents);

    println!(
        "{} documents: {} succeeded, {} failed",
        report.outcomes.len(),
        report.succeeded(),
        report.failed()
    );
    for outcome in &report.outcomes {
        if let Err(error) = &outcome.result {
            println!("  {}: {error}", outcome.document.display());
        }
    }
    Ok(())
}
