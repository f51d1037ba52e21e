use std::collections::{BTreeMap, HashMap, HashSet};

use crate::analysis::{FieldAnalyzers, Token};
use crate::document::{Document, INDEXED_FIELDS};
use crate::error::{EngineError, Result};
use crate::index::{DocId, FieldIndex, InvertedIndex, Posting, TermId};

#[derive(Default)]
struct FieldAccumulator {
    dictionary: HashMap<String, TermId>,
    postings: Vec<Vec<Posting>>,
    lengths: Vec<u32>,
    total_length: u64,
}

impl FieldAccumulator {
    fn ingest(&mut self, doc_id: DocId, tokens: Vec<Token>) {
        let mut length = 0u32;
        let mut last_pos = None;
        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        for (term, pos) in tokens {
            // tokens stacked on one position (synonyms) count once toward the field length
            if last_pos != Some(pos) {
                length += 1;
                last_pos = Some(pos);
            }
            let next_id = self.postings.len() as TermId;
            let tid = *self.dictionary.entry(term).or_insert(next_id);
            if tid == next_id {
                self.postings.push(Vec::new());
            }
            *tf_counts.entry(tid).or_insert(0) += 1;
        }
        for (tid, tf) in tf_counts {
            self.postings[tid as usize].push(Posting { doc_id, tf });
        }
        self.lengths.push(length);
        self.total_length += length as u64;
    }

    fn freeze(mut self) -> FieldIndex {
        for plist in self.postings.iter_mut() {
            plist.sort_by_key(|p| p.doc_id);
        }
        FieldIndex {
            dictionary: self.dictionary,
            postings: self.postings,
            lengths: self.lengths,
            total_length: self.total_length,
        }
    }
}

/// Bulk index construction. Documents get dense ordinals in the order they are added.
pub struct IndexBuilder {
    analyzers: FieldAnalyzers,
    fields: BTreeMap<String, FieldAccumulator>,
    docs: Vec<Document>,
    seen_ids: HashSet<String>,
}

impl IndexBuilder {
    pub fn new(analyzers: FieldAnalyzers) -> Self {
        let fields = INDEXED_FIELDS
            .iter()
            .map(|f| (f.to_string(), FieldAccumulator::default()))
            .collect();
        Self { analyzers, fields, docs: Vec::new(), seen_ids: HashSet::new() }
    }

    pub fn add(&mut self, doc: Document) -> Result<DocId> {
        if !self.seen_ids.insert(doc.id.clone()) {
            return Err(EngineError::DuplicateDocument(doc.id));
        }
        let doc_id = self.docs.len() as DocId;
        for (name, acc) in self.fields.iter_mut() {
            let tokens = self.analyzers.tokenize(name, doc.field(name));
            acc.ingest(doc_id, tokens);
        }
        self.docs.push(doc);
        Ok(doc_id)
    }

    pub fn finish(self) -> Result<InvertedIndex> {
        if self.docs.is_empty() {
            return Err(EngineError::EmptyCollection);
        }
        let fields: BTreeMap<String, FieldIndex> =
            self.fields.into_iter().map(|(name, acc)| (name, acc.freeze())).collect();
        for (name, field) in &fields {
            tracing::info!(field = %name, num_terms = field.num_terms(), total_length = field.total_length, "field indexed");
        }
        tracing::info!(num_docs = self.docs.len(), analyzers = %self.analyzers, "index built");
        Ok(InvertedIndex { fields, docs: self.docs, analyzers: self.analyzers })
    }
}

/// Build an index over `docs`, analyzing each indexed field with its assigned analyzer.
pub fn build<I>(docs: I, analyzers: FieldAnalyzers) -> Result<InvertedIndex>
where
    I: IntoIterator<Item = Document>,
{
    let mut builder = IndexBuilder::new(analyzers);
    for doc in docs {
        builder.add(doc)?;
    }
    builder.finish()
}
