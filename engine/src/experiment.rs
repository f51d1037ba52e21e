use rayon::prelude::*;

use crate::analysis::FieldAnalyzers;
use crate::builder;
use crate::config::{ExperimentConfig, Strategy};
use crate::document::{Document, CONTENT, TITLE};
use crate::error::{EngineError, Result};
use crate::index::InvertedIndex;
use crate::query::{self, Query};
use crate::rerank::rerank_by_title;
use crate::rocchio;
use crate::run::{to_entries, RunEntry};
use crate::search::{ScoredDoc, Searcher};

/// One validated experiment configuration, runnable against any index built with its analyzers.
#[derive(Debug, Clone)]
pub struct Experiment {
    config: ExperimentConfig,
    analyzers: FieldAnalyzers,
    run_tag: String,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let analyzers = config.analyzers()?;
        let run_tag = config.run_tag();
        Ok(Self { config, analyzers, run_tag })
    }

    pub fn config(&self) -> &ExperimentConfig { &self.config }

    pub fn run_tag(&self) -> &str { &self.run_tag }

    pub fn analyzers(&self) -> &FieldAnalyzers { &self.analyzers }

    pub fn build_index(&self, docs: Vec<Document>) -> Result<InvertedIndex> {
        builder::build(docs, self.analyzers.clone())
    }

    /// The run tag names the analyzers, so an index analyzed any other way is refused.
    pub fn check_index(&self, index: &InvertedIndex) -> Result<()> {
        if index.analyzers() != &self.analyzers {
            return Err(EngineError::AnalyzerMismatch {
                expected: self.analyzers.to_string(),
                found: index.analyzers().to_string(),
            });
        }
        Ok(())
    }

    /// Evaluate every query in parallel. Output keeps the input query order; queries that retrieve
    /// nothing contribute no entries.
    pub fn run(&self, index: &InvertedIndex, queries: &[(u32, String)]) -> Result<Vec<RunEntry>> {
        self.check_index(index)?;
        let per_query: Vec<Vec<RunEntry>> = queries
            .par_iter()
            .map(|(qid, text)| self.run_query(index, *qid, text))
            .collect();
        let entries: Vec<RunEntry> = per_query.into_iter().flatten().collect();
        tracing::info!(
            strategy = %self.config.strategy,
            run_tag = %self.run_tag,
            queries = queries.len(),
            entries = entries.len(),
            "run complete"
        );
        Ok(entries)
    }

    pub fn run_query(&self, index: &InvertedIndex, query_id: u32, text: &str) -> Vec<RunEntry> {
        if text.trim().is_empty() {
            tracing::warn!(query_id, "skipping blank query");
            return Vec::new();
        }
        let searcher = Searcher::new(index, self.config.bm25);
        let query = self.parse(&searcher, query_id, text);
        if query.tree.is_empty() {
            tracing::warn!(query_id, "query has no searchable terms");
            return Vec::new();
        }
        let hits = self.retrieve(&searcher, &query);
        tracing::debug!(query_id, hits = hits.len(), "query evaluated");
        to_entries(query_id, &hits, index, &self.run_tag)
    }

    fn parse(&self, searcher: &Searcher<'_>, query_id: u32, text: &str) -> Query {
        let analyzers = searcher.index().analyzers();
        let tree = match self.config.strategy {
            Strategy::FieldBoost => {
                let boost = self.config.field_boost;
                query::parse_fields(analyzers, text, &[(TITLE, boost.title), (CONTENT, boost.body)])
            }
            Strategy::Ngram => query::parse_fields(analyzers, text, &[(CONTENT, 1.0), (TITLE, 1.0)]),
            _ => query::parse(analyzers, text, CONTENT),
        };
        Query::new(query_id, text, tree)
    }

    fn retrieve(&self, searcher: &Searcher<'_>, query: &Query) -> Vec<ScoredDoc> {
        let config = &self.config;
        let search = |q: &query::QueryNode, k: usize| searcher.search(q, k);
        match config.strategy {
            Strategy::Rocchio => {
                let expansion = rocchio::expand(&query.tree, searcher.index(), search, &config.rocchio);
                searcher.search(&expansion.query, config.top_k)
            }
            Strategy::Rerank => {
                let expansion = rocchio::expand(&query.tree, searcher.index(), search, &config.rocchio);
                let mut base = searcher.search(&expansion.query, config.rerank.top_n);
                if base.is_empty() {
                    tracing::warn!(query_id = query.id, "expanded query retrieved nothing, using original");
                    base = searcher.search(&query.tree, config.rerank.top_n);
                }
                rerank_by_title(searcher, &base, &query.raw_text, config.rerank.boost)
            }
            _ => searcher.search(&query.tree, config.top_k),
        }
    }
}
