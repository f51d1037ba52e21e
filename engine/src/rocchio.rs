//! Pseudo-relevance feedback: expand a query with the strongest terms of its own top-ranked documents.
//!
//! The expanded query keeps the original tree boosted by `alpha` and adds one `content` clause per
//! expansion term. Clause boosts are scaled linearly into `[0.5 * beta, beta]` by the term's TF-IDF weight
//! relative to the strongest candidate. There is no negative-feedback component.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::CONTENT;
use crate::error::{EngineError, Result};
use crate::index::InvertedIndex;
use crate::query::{QueryNode, TermClause};
use crate::search::ScoredDoc;
use crate::similarity::classic_idf;

/// Feedback tokens shorter than this many characters are ignored.
pub const MIN_TERM_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RocchioParams {
    /// Boost on the original query.
    pub alpha: f32,
    /// Boost ceiling for expansion terms.
    pub beta: f32,
    pub feedback_docs: usize,
    pub max_expansion_terms: usize,
}

impl Default for RocchioParams {
    fn default() -> Self {
        Self { alpha: 1.0, beta: 0.75, feedback_docs: 10, max_expansion_terms: 15 }
    }
}

impl RocchioParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(EngineError::invalid("alpha", format!("must be >= 0, got {}", self.alpha)));
        }
        if !(self.beta.is_finite() && self.beta >= 0.0) {
            return Err(EngineError::invalid("beta", format!("must be >= 0, got {}", self.beta)));
        }
        if self.feedback_docs == 0 {
            return Err(EngineError::invalid("feedback_docs", "must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionTerm {
    pub term: String,
    pub weight: f64,
    pub boost: f32,
}

#[derive(Debug, Clone)]
pub struct Expansion {
    pub query: QueryNode,
    pub terms: Vec<ExpansionTerm>,
    /// Number of documents in the feedback pool; zero means the original query was returned as is.
    pub pool_size: usize,
}

impl Expansion {
    pub fn is_fallback(&self) -> bool { self.pool_size == 0 }
}

/// Expand `query` from the top `feedback_docs` results of `search_fn(query, feedback_docs)`.
///
/// An empty feedback pool returns the original query unchanged.
pub fn expand<F>(query: &QueryNode, index: &InvertedIndex, search_fn: F, params: &RocchioParams) -> Expansion
where
    F: Fn(&QueryNode, usize) -> Vec<ScoredDoc>,
{
    let pool = search_fn(query, params.feedback_docs.max(1));
    if pool.is_empty() {
        tracing::warn!(query = %query, "empty feedback pool, keeping original query");
        return Expansion { query: query.clone(), terms: Vec::new(), pool_size: 0 };
    }

    let terms = select_terms(query, index, &pool, params);
    let mut clauses = Vec::with_capacity(terms.len() + 1);
    clauses.push(query.clone().boosted(params.alpha));
    clauses.extend(terms.iter().map(|t| {
        QueryNode::Term(TermClause { field: CONTENT.to_string(), term: t.term.clone(), boost: t.boost })
    }));
    tracing::debug!(pool = pool.len(), added = terms.len(), "query expanded");
    Expansion { query: QueryNode::Or(clauses), terms, pool_size: pool.len() }
}

fn select_terms(
    query: &QueryNode,
    index: &InvertedIndex,
    pool: &[ScoredDoc],
    params: &RocchioParams,
) -> Vec<ExpansionTerm> {
    let analyzers = index.analyzers();
    // first-seen order is the tie-break for equal weights
    let mut counts: IndexMap<String, u32> = IndexMap::new();
    for hit in pool {
        let Some(doc) = index.document(hit.doc_id) else { continue };
        let text = format!("{} {}", doc.title(), doc.content());
        for (term, _) in analyzers.tokenize(CONTENT, &text) {
            if term.chars().count() < MIN_TERM_CHARS {
                continue;
            }
            *counts.entry(term).or_insert(0) += 1;
        }
    }

    let original = query.term_set();
    let num_docs = index.num_docs();
    let mut candidates: Vec<ExpansionTerm> = counts
        .into_iter()
        .filter(|(term, _)| !original.contains(term.as_str()))
        .filter_map(|(term, tf)| {
            let df = index.doc_freq(CONTENT, &term);
            (df > 0).then(|| ExpansionTerm { weight: tf as f64 * classic_idf(num_docs, df), term, boost: 0.0 })
        })
        .collect();
    candidates.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    candidates.truncate(params.max_expansion_terms);

    let max_weight = candidates.first().map(|t| t.weight).unwrap_or(0.0);
    for t in candidates.iter_mut() {
        let norm = if max_weight > 0.0 { t.weight / max_weight } else { 0.0 };
        t.boost = (params.beta as f64 * (0.5 + 0.5 * norm)) as f32;
    }
    candidates
}
