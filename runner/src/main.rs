use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use engine::{Experiment, ExperimentConfig, Strategy};
use runner::{evaluate, prepare_index, read_queries, run_to_file, sweep, DEFAULT_B_GRID, DEFAULT_K1_GRID};
use tracing_subscriber::{EnvFilter, fmt};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "runner")]
#[command(about = "Run retrieval experiments over a Cranfield-format collection and write TREC runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every query with one strategy and write a run file
    Run {
        #[command(flatten)]
        inputs: Inputs,
        /// Run file to write
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Write one BM25 run per (k1, b) pair
    Sweep {
        #[command(flatten)]
        inputs: Inputs,
        /// Directory receiving bm25_<k1>_<b>.txt files
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_K1_GRID)]
        k1: Vec<f32>,
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_B_GRID)]
        b: Vec<f32>,
        /// JSON experiment configuration supplying the remaining parameters
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        analyzer: Option<String>,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Score a run file with trec_eval
    Eval {
        #[arg(long, default_value = "trec_eval")]
        trec_eval: PathBuf,
        /// Judgments file, or a directory containing qrels / cranqrel
        #[arg(long)]
        qrels: PathBuf,
        #[arg(long)]
        run: PathBuf,
        /// Extra arguments passed before the file operands, e.g. -m map
        #[arg(last = true)]
        args: Vec<String>,
    },
}

#[derive(Args)]
struct Inputs {
    /// Collection file, or a directory containing cran.all.1400
    #[arg(long)]
    collection: PathBuf,
    /// Query file, or a directory containing cran.qry
    #[arg(long)]
    queries: PathBuf,
    /// Prebuilt index directory; the collection is indexed in memory when absent
    #[arg(long)]
    index: Option<PathBuf>,
}

#[derive(Args)]
struct Overrides {
    /// JSON experiment configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    strategy: Option<Strategy>,
    /// Analyzer replacing the strategy's default; must match the one a prebuilt index was built with
    #[arg(long)]
    analyzer: Option<String>,
    #[arg(long)]
    k1: Option<f32>,
    #[arg(long)]
    b: Option<f32>,
    #[arg(long)]
    title_boost: Option<f32>,
    #[arg(long)]
    body_boost: Option<f32>,
    #[arg(long)]
    alpha: Option<f32>,
    #[arg(long)]
    beta: Option<f32>,
    #[arg(long)]
    feedback_docs: Option<usize>,
    #[arg(long)]
    expansion_terms: Option<usize>,
    #[arg(long)]
    rerank_boost: Option<f32>,
    #[arg(long)]
    top_n: Option<usize>,
    #[arg(long)]
    top_k: Option<usize>,
    #[arg(long)]
    run_tag: Option<String>,
}

impl Overrides {
    fn resolve(self) -> Result<ExperimentConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(v) = self.strategy { config.strategy = v; }
        if self.analyzer.is_some() { config.analyzer = self.analyzer; }
        if let Some(v) = self.k1 { config.bm25.k1 = v; }
        if let Some(v) = self.b { config.bm25.b = v; }
        if let Some(v) = self.title_boost { config.field_boost.title = v; }
        if let Some(v) = self.body_boost { config.field_boost.body = v; }
        if let Some(v) = self.alpha { config.rocchio.alpha = v; }
        if let Some(v) = self.beta { config.rocchio.beta = v; }
        if let Some(v) = self.feedback_docs { config.rocchio.feedback_docs = v; }
        if let Some(v) = self.expansion_terms { config.rocchio.max_expansion_terms = v; }
        if let Some(v) = self.rerank_boost { config.rerank.boost = v; }
        if let Some(v) = self.top_n { config.rerank.top_n = v; }
        if let Some(v) = self.top_k { config.top_k = v; }
        if self.run_tag.is_some() { config.run_tag = self.run_tag; }
        config.validate()?;
        Ok(config)
    }
}

fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(path) => ExperimentConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(ExperimentConfig::default()),
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { inputs, output, overrides } => {
            let experiment = Experiment::new(overrides.resolve()?)?;
            let index = prepare_index(&experiment, &inputs.collection, inputs.index.as_deref())?;
            let queries = read_queries(&inputs.queries)?;
            let summary = run_to_file(&experiment, &index, &queries, &output)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Sweep { inputs, out_dir, k1, b, config, analyzer, top_k } => {
            let mut base = load_config(config.as_deref())?;
            base.strategy = Strategy::Bm25;
            if analyzer.is_some() { base.analyzer = analyzer; }
            if let Some(v) = top_k { base.top_k = v; }
            let experiment = Experiment::new(base.clone())?;
            let index = prepare_index(&experiment, &inputs.collection, inputs.index.as_deref())?;
            let queries = read_queries(&inputs.queries)?;
            let summaries = sweep(&base, &k1, &b, &index, &queries, &out_dir)?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Commands::Eval { trec_eval, qrels, run, args } => {
            print!("{}", evaluate(&trec_eval, &qrels, &run, &args)?);
        }
    }
    Ok(())
}
