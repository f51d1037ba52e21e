use anyhow::{bail, Context, Result};
use engine::cranfield::{load_collection, load_qrels, load_queries};
use engine::persist::{load_index, IndexPaths};
use engine::run::write_run_file;
use engine::{Experiment, ExperimentConfig, InvertedIndex, Strategy};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_K1_GRID: [f32; 4] = [0.8, 1.2, 1.5, 2.0];
pub const DEFAULT_B_GRID: [f32; 3] = [0.4, 0.6, 0.75];

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub strategy: String,
    pub run_tag: String,
    pub queries: usize,
    pub queries_with_hits: usize,
    pub entries: usize,
    pub output: PathBuf,
    pub took_s: f64,
}

/// Load a persisted index when `index_dir` is given, otherwise build one from the collection with the
/// experiment's analyzers.
pub fn prepare_index(experiment: &Experiment, collection: &Path, index_dir: Option<&Path>) -> Result<InvertedIndex> {
    if let Some(dir) = index_dir {
        return load_index(&IndexPaths::new(dir)).with_context(|| format!("loading index {}", dir.display()));
    }
    let docs = load_collection(collection).with_context(|| format!("reading collection {}", collection.display()))?;
    tracing::info!(num_docs = docs.len(), "parsed collection");
    Ok(experiment.build_index(docs)?)
}

pub fn read_queries(path: &Path) -> Result<Vec<(u32, String)>> {
    let queries = load_queries(path).with_context(|| format!("reading queries {}", path.display()))?;
    tracing::info!(queries = queries.len(), "parsed queries");
    Ok(queries)
}

/// Run every query and write the TREC run file.
pub fn run_to_file(
    experiment: &Experiment,
    index: &InvertedIndex,
    queries: &[(u32, String)],
    output: &Path,
) -> Result<RunSummary> {
    let start = std::time::Instant::now();
    let entries = experiment.run(index, queries)?;
    write_run_file(output, &entries).with_context(|| format!("writing run {}", output.display()))?;
    let mut with_hits: Vec<u32> = entries.iter().map(|e| e.query_id).collect();
    with_hits.dedup();
    Ok(RunSummary {
        strategy: experiment.config().strategy.to_string(),
        run_tag: experiment.run_tag().to_string(),
        queries: queries.len(),
        queries_with_hits: with_hits.len(),
        entries: entries.len(),
        output: output.to_path_buf(),
        took_s: start.elapsed().as_secs_f64(),
    })
}

/// BM25 k1 x b grid: one run file `bm25_<k1>_<b>.txt` per pair in `out_dir`, all against one index.
pub fn sweep(
    base: &ExperimentConfig,
    k1s: &[f32],
    bs: &[f32],
    index: &InvertedIndex,
    queries: &[(u32, String)],
    out_dir: &Path,
) -> Result<Vec<RunSummary>> {
    fs::create_dir_all(out_dir)?;
    let mut summaries = Vec::with_capacity(k1s.len() * bs.len());
    for &k1 in k1s {
        for &b in bs {
            let mut config = base.clone();
            config.strategy = Strategy::Bm25;
            config.bm25.k1 = k1;
            config.bm25.b = b;
            config.run_tag = None;
            let experiment = Experiment::new(config)?;
            let output = out_dir.join(format!("bm25_{k1}_{b}.txt"));
            summaries.push(run_to_file(&experiment, index, queries, &output)?);
        }
    }
    Ok(summaries)
}

/// `<run>.norm.qrels` beside the run file. Always a different path from `run` itself.
pub fn normalized_qrels_path(run: &Path) -> PathBuf {
    let mut name = run.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".norm.qrels");
    run.with_file_name(name)
}

/// Normalize the judgments next to the run file and score the run with an external `trec_eval`.
pub fn evaluate(trec_eval: &Path, qrels: &Path, run: &Path, extra_args: &[String]) -> Result<String> {
    let lines = load_qrels(qrels).with_context(|| format!("reading qrels {}", qrels.display()))?;
    let normalized = normalized_qrels_path(run);
    fs::write(&normalized, lines.join("\n") + "\n")?;

    let output = Command::new(trec_eval)
        .args(extra_args)
        .arg(&normalized)
        .arg(run)
        .output()
        .with_context(|| format!("launching {}", trec_eval.display()))?;
    if !output.status.success() {
        bail!(
            "{} exited with {}: {}",
            trec_eval.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
