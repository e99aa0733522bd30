use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use telusur_core::config::EngineConfig;
use telusur_core::{DirectorySource, DocumentSource, SearchEngine};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "telusur-indexer")]
#[command(about = "Build and query an LSI model over Indonesian documents", long_about = None)]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Stopword list, one word per line
    #[arg(long, global = true)]
    stopwords: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a folder of documents, fit the model and save it
    Build {
        /// Folder containing the corpus
        #[arg(long)]
        input: PathBuf,
        /// Output model file
        #[arg(long, default_value = "ir_model.bin")]
        output: PathBuf,
        /// Number of LSI topics (clamped to what the corpus supports)
        #[arg(long)]
        topics: Option<usize>,
        /// Preprocess documents on a single thread
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Search a saved model
    Search {
        #[arg(long, default_value = "ir_model.bin")]
        model: PathBuf,
        /// Query text
        query: String,
        /// Number of results
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Print a query's stems, weights, topic vector and singular values as JSON
    Inspect {
        #[arg(long, default_value = "ir_model.bin")]
        model: PathBuf,
        query: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Most frequent stems in a saved model
    Stats {
        #[arg(long, default_value = "ir_model.bin")]
        model: PathBuf,
        #[arg(long, default_value_t = 500)]
        limit: usize,
    },
}

#[derive(Serialize)]
struct Hit<'a> {
    rank: usize,
    id: &'a str,
    score: f64,
    snippet: String,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(path) = cli.stopwords {
        config.stopwords_path = path;
    }

    match cli.command {
        Commands::Build { input, output, topics, sequential } => {
            if let Some(k) = topics {
                config.num_topics = k;
            }
            config.parallel &= !sequential;
            build(config, &input, &output)
        }
        Commands::Search { model, query, k } => {
            let top_n = k.unwrap_or(config.top_n);
            let engine = open(config, &model)?;
            search(&engine, &query, top_n)
        }
        Commands::Inspect { model, query, k } => {
            let top_n = k.unwrap_or(config.top_n);
            let engine = open(config, &model)?;
            let explanation = engine.explain(&query, top_n)?;
            println!("{}", serde_json::to_string_pretty(&explanation)?);
            Ok(())
        }
        Commands::Stats { model, limit } => {
            let engine = open(config, &model)?;
            for (term, count) in engine.term_statistics(limit)? {
                println!("{count:>8}  {term}");
            }
            Ok(())
        }
    }
}

fn build(config: EngineConfig, input: &Path, output: &Path) -> Result<()> {
    if !input.is_dir() {
        bail!("input {} is not a directory", input.display());
    }
    let outcome = DirectorySource::new(input).read();
    let skipped = outcome.skipped().count();
    let documents = outcome.into_documents();
    tracing::info!(loaded = documents.len(), skipped, "corpus read");

    let num_topics = config.num_topics;
    let engine = SearchEngine::new(config);
    engine.fit(documents, num_topics).context("fitting model")?;
    engine.save(output).with_context(|| format!("saving model to {}", output.display()))?;

    tracing::info!(output = %output.display(), "model build complete");
    Ok(())
}

fn open(config: EngineConfig, model: &Path) -> Result<SearchEngine> {
    let engine = SearchEngine::new(config);
    engine.load(model).with_context(|| format!("loading model from {}", model.display()))?;
    Ok(engine)
}

fn search(engine: &SearchEngine, query: &str, top_n: usize) -> Result<()> {
    let snapshot = engine.snapshot()?;
    let snippet_chars = engine.config().snippet_chars;
    for (rank, hit) in engine.search(query, top_n)?.iter().enumerate() {
        let doc = &snapshot.documents()[hit.index];
        let line = Hit { rank: rank + 1, id: &hit.id, score: hit.score, snippet: doc.snippet(snippet_chars) };
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}
