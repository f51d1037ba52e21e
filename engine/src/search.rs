use std::cmp::Ordering;
use std::collections::HashMap;

use crate::index::{DocId, FieldIndex, InvertedIndex};
use crate::query::{self, QueryNode, TermClause};
use crate::similarity::Bm25;

pub const DEFAULT_TOP_K: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

/// Score descending, then document ordinal ascending.
pub fn rank_order(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id))
}

/// Per-clause statistics resolved once per evaluation.
struct TermStats<'i> {
    field: &'i FieldIndex,
    idf: f32,
    avg_len: f32,
}

/// Evaluates query trees against a borrowed, read-only index with BM25.
#[derive(Clone, Copy)]
pub struct Searcher<'a> {
    index: &'a InvertedIndex,
    similarity: Bm25,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a InvertedIndex, similarity: Bm25) -> Self {
        Self { index, similarity }
    }

    pub fn index(&self) -> &'a InvertedIndex { self.index }

    /// Parse `raw` with the analyzer the index used for `field`.
    pub fn parse(&self, raw: &str, field: &str) -> QueryNode {
        query::parse(self.index.analyzers(), raw, field)
    }

    /// Top `top_k` matching documents, ranked by [`rank_order`].
    pub fn search(&self, query: &QueryNode, top_k: usize) -> Vec<ScoredDoc> {
        if top_k == 0 || query.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<ScoredDoc> = self
            .eval(query)
            .into_iter()
            .map(|(doc_id, score)| ScoredDoc { doc_id, score })
            .collect();
        hits.sort_by(rank_order);
        hits.truncate(top_k);
        hits
    }

    /// Score of `query` for a single document; zero when it does not match.
    pub fn explain(&self, query: &QueryNode, doc_id: DocId) -> f32 {
        self.score_doc(query, doc_id).unwrap_or(0.0)
    }

    fn term_stats(&self, clause: &TermClause) -> Option<TermStats<'a>> {
        let field = self.index.field(&clause.field)?;
        let df = field.doc_freq(&clause.term);
        if df == 0 {
            return None;
        }
        Some(TermStats {
            field,
            idf: Bm25::idf(self.index.num_docs(), df),
            avg_len: self.index.avg_field_length(&clause.field),
        })
    }

    fn term_score(&self, clause: &TermClause, stats: &TermStats<'_>, doc_id: DocId, tf: u32) -> f32 {
        let len = stats.field.field_length(doc_id);
        clause.boost * self.similarity.score(stats.idf, tf, len, stats.avg_len)
    }

    fn eval(&self, node: &QueryNode) -> HashMap<DocId, f32> {
        match node {
            QueryNode::Term(clause) => {
                let Some(stats) = self.term_stats(clause) else {
                    return HashMap::new();
                };
                stats
                    .field
                    .postings(&clause.term)
                    .iter()
                    .map(|p| (p.doc_id, self.term_score(clause, &stats, p.doc_id, p.tf)))
                    .collect()
            }
            QueryNode::Or(children) => {
                let mut acc: HashMap<DocId, f32> = HashMap::new();
                for child in children {
                    for (doc_id, score) in self.eval(child) {
                        *acc.entry(doc_id).or_insert(0.0) += score;
                    }
                }
                acc
            }
            QueryNode::And(children) => {
                let mut iter = children.iter();
                let Some(first) = iter.next() else {
                    return HashMap::new();
                };
                let mut acc = self.eval(first);
                for child in iter {
                    let scores = self.eval(child);
                    acc.retain(|doc_id, _| scores.contains_key(doc_id));
                    for (doc_id, total) in acc.iter_mut() {
                        *total += scores[doc_id];
                    }
                }
                acc
            }
            QueryNode::Boost { query, boost } => {
                let mut scores = self.eval(query);
                for score in scores.values_mut() {
                    *score *= boost;
                }
                scores
            }
        }
    }

    /// `None` when the document does not match `node`. Mirrors [`Self::eval`] operation for operation.
    fn score_doc(&self, node: &QueryNode, doc_id: DocId) -> Option<f32> {
        match node {
            QueryNode::Term(clause) => {
                let stats = self.term_stats(clause)?;
                let tf = stats.field.term_freq(&clause.term, doc_id);
                (tf > 0).then(|| self.term_score(clause, &stats, doc_id, tf))
            }
            QueryNode::Or(children) => {
                let mut total: Option<f32> = None;
                for child in children {
                    if let Some(score) = self.score_doc(child, doc_id) {
                        *total.get_or_insert(0.0) += score;
                    }
                }
                total
            }
            QueryNode::And(children) => {
                let mut iter = children.iter();
                let mut total = self.score_doc(iter.next()?, doc_id)?;
                for child in iter {
                    total += self.score_doc(child, doc_id)?;
                }
                Some(total)
            }
            QueryNode::Boost { query, boost } => self.score_doc(query, doc_id).map(|s| s * boost),
        }
    }
}
