use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use phonalyzer::config::{ConfigOverrides, CorpusConfig};
use phonalyzer::{run_corpus_pass, PraatEngine};

/// Phonalyzer - acoustic feature extraction for annotated speech corpora
///
/// Walks `<CORPUS_ROOT>/<speaker>/<recording>.TextGrid` (+ `.wav`), measures
/// every labelled fricative and approximant interval, and writes one CSV row
/// per token.
#[derive(Parser, Debug)]
#[command(name = "phonalyzer")]
#[command(version = "0.1.0")]
#[command(about = "Per-segment acoustic measurements for a speech corpus", long_about = None)]
struct Args {
    /// Corpus directory holding one subdirectory per speaker
    #[arg(value_name = "CORPUS_ROOT")]
    corpus_root: PathBuf,

    /// Output CSV path (default: next to the corpus root)
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Worker threads (default: available parallelism)
    #[arg(long, short, value_name = "N")]
    jobs: Option<usize>,

    /// JSON file overriding tiers, constants, output, or jobs
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log per-interval progress
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn validate(&self) -> Result<()> {
        if !self.corpus_root.exists() {
            bail!("Corpus root does not exist: {:?}", self.corpus_root);
        }
        if !self.corpus_root.is_dir() {
            bail!("Corpus root is not a directory: {:?}", self.corpus_root);
        }
        if self.jobs == Some(0) {
            bail!("--jobs must be at least 1");
        }
        if let Some(config) = &self.config {
            if !config.is_file() {
                bail!("Config file does not exist: {:?}", config);
            }
        }
        Ok(())
    }

    fn corpus_config(&self) -> Result<CorpusConfig> {
        let mut config = CorpusConfig::from_root(&self.corpus_root)?;
        if let Some(path) = &self.config {
            config = config.apply(ConfigOverrides::load(path)?);
        }
        if let Some(output) = &self.output {
            config = config.with_output(output.clone());
        }
        if let Some(jobs) = self.jobs {
            config = config.with_jobs(jobs);
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "phonalyzer=debug" } else { "phonalyzer=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    args.validate()
        .context("Failed to validate command-line arguments")?;
    let config = args
        .corpus_config()
        .context("Failed to build corpus configuration")?;

    let table = run_corpus_pass(&config, &PraatEngine::new()).context("Corpus pass failed")?;
    println!(
        "Processed {} tokens ({} columns)",
        table.len(),
        table.columns().len()
    );
    if !table.is_empty() {
        println!("Results saved to: {}", config.output_path.display());
    }
    Ok(())
}
