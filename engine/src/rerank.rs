use crate::document::TITLE;
use crate::query::QueryNode;
use crate::search::{ScoredDoc, Searcher};

/// Add `boost` times the title-field score of `raw_query` to every base hit and re-sort.
pub fn rerank_by_title(searcher: &Searcher<'_>, base: &[ScoredDoc], raw_query: &str, boost: f32) -> Vec<ScoredDoc> {
    let title_query = searcher.parse(raw_query, TITLE);
    rerank(searcher, base, &title_query, boost)
}

/// `score + boost * explain(aux_query, doc)` for every hit, sorted by the new score descending.
///
/// The sort is stable: equal new scores keep their base order.
pub fn rerank(searcher: &Searcher<'_>, base: &[ScoredDoc], aux_query: &QueryNode, boost: f32) -> Vec<ScoredDoc> {
    let mut reranked: Vec<ScoredDoc> = base
        .iter()
        .map(|hit| ScoredDoc {
            doc_id: hit.doc_id,
            score: hit.score + boost * searcher.explain(aux_query, hit.doc_id),
        })
        .collect();
    reranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    reranked
}
