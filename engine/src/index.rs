use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::analysis::FieldAnalyzers;
use crate::document::Document;

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Postings and length statistics for one field.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FieldIndex {
    pub(crate) dictionary: HashMap<String, TermId>,
    /// Indexed by term id; each list sorted by doc_id without duplicates.
    pub(crate) postings: Vec<Vec<Posting>>,
    /// Indexed by doc id; number of token positions in the field.
    pub(crate) lengths: Vec<u32>,
    pub(crate) total_length: u64,
}

impl FieldIndex {
    pub fn num_terms(&self) -> usize { self.dictionary.len() }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    /// Postings for `term`; empty when the term is not in the vocabulary.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.term_id(term)
            .and_then(|tid| self.postings.get(tid as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn doc_freq(&self, term: &str) -> u32 { self.postings(term).len() as u32 }

    pub fn term_freq(&self, term: &str, doc_id: DocId) -> u32 {
        let postings = self.postings(term);
        match postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(i) => postings[i].tf,
            Err(_) => 0,
        }
    }

    pub fn field_length(&self, doc_id: DocId) -> u32 {
        self.lengths.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn total_length(&self) -> u64 { self.total_length }
}

/// Immutable per-field inverted index over a document collection, addressed by dense document ordinals.
///
/// Built once by [`crate::builder::IndexBuilder`]; every search borrows it read-only.
#[derive(Debug, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub(crate) fields: BTreeMap<String, FieldIndex>,
    pub(crate) docs: Vec<Document>,
    pub(crate) analyzers: FieldAnalyzers,
}

impl InvertedIndex {
    pub fn num_docs(&self) -> u32 { self.docs.len() as u32 }

    pub fn analyzers(&self) -> &FieldAnalyzers { &self.analyzers }

    pub fn field(&self, name: &str) -> Option<&FieldIndex> { self.fields.get(name) }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> { self.docs.get(doc_id as usize) }

    pub fn documents(&self) -> &[Document] { &self.docs }

    pub fn doc_freq(&self, field: &str, term: &str) -> u32 {
        self.field(field).map(|f| f.doc_freq(term)).unwrap_or(0)
    }

    /// Mean field length over the whole collection, zero for an unknown field.
    pub fn avg_field_length(&self, field: &str) -> f32 {
        match self.field(field) {
            Some(f) if !self.docs.is_empty() => f.total_length as f32 / self.docs.len() as f32,
            _ => 0.0,
        }
    }
}
