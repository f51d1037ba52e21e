use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine::cranfield::load_collection;
use engine::persist::{save_index, save_meta, IndexPaths, MetaFile, INDEX_VERSION};
use engine::{builder, Analyzer, FieldAnalyzers, Strategy};
use tracing_subscriber::{EnvFilter, fmt};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a per-field BM25 index over a Cranfield-format collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the collection, build the index with a strategy's analyzers and write it to disk
    Build {
        /// Collection file, or a directory containing cran.all.1400
        #[arg(long)]
        collection: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Strategy whose analyzer profile is used
        #[arg(long, default_value = "baseline")]
        strategy: Strategy,
        /// Default analyzer, replacing the strategy profile's default; pass the same name to `runner --analyzer`
        #[arg(long)]
        analyzer: Option<String>,
        /// Per-field analyzer as FIELD=NAME; unknown names fall back to the default analyzer
        #[arg(long = "field", value_parser = parse_field_analyzer)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field_analyzer(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(field, name)| (field.trim().to_string(), name.trim().to_string()))
        .ok_or_else(|| format!("expected FIELD=NAME, got `{s}`"))
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { collection, output, strategy, analyzer, fields } => {
            let mut analyzers = strategy.analyzers();
            if let Some(name) = analyzer {
                analyzers = analyzers.with_default(name.parse::<Analyzer>()?);
            }
            let analyzers = analyzers.with_field_names(fields.iter().map(|(f, n)| (f.as_str(), n.as_str())));
            build_index(&collection, &output, strategy, analyzers)
        }
    }
}

fn build_index(collection: &Path, output: &Path, strategy: Strategy, analyzers: FieldAnalyzers) -> Result<()> {
    let docs = load_collection(collection)
        .with_context(|| format!("reading collection {}", collection.display()))?;
    tracing::info!(num_docs = docs.len(), "parsed collection");

    let summary = analyzers.to_string();
    let index = builder::build(docs, analyzers).context("building index")?;

    let out_paths = IndexPaths::new(output);
    save_index(&out_paths, &index)?;
    let meta = MetaFile {
        num_docs: index.num_docs(),
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: INDEX_VERSION,
        strategy: strategy.to_string(),
        analyzers: summary,
    };
    save_meta(&out_paths, &meta)?;

    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}
