//! TREC run format: `<queryId> Q0 <documentId> <rank> <score> <runTag>`, one line per retrieved document.

use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::index::InvertedIndex;
use crate::search::ScoredDoc;

#[derive(Debug, Clone, PartialEq)]
pub struct RunEntry {
    pub query_id: u32,
    pub doc_id: String,
    /// 1-based.
    pub rank: usize,
    pub score: f32,
    pub run_tag: String,
}

impl fmt::Display for RunEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Q0 {} {} {} {}", self.query_id, self.doc_id, self.rank, self.score, self.run_tag)
    }
}

/// Turn ranked hits into run entries with contiguous ranks starting at 1.
pub fn to_entries(query_id: u32, hits: &[ScoredDoc], index: &InvertedIndex, run_tag: &str) -> Vec<RunEntry> {
    hits.iter()
        .filter_map(|hit| index.document(hit.doc_id).map(|doc| (doc, hit.score)))
        .enumerate()
        .map(|(i, (doc, score))| RunEntry {
            query_id,
            doc_id: doc.id.clone(),
            rank: i + 1,
            score,
            run_tag: run_tag.to_string(),
        })
        .collect()
}

pub fn write_run<W: Write>(writer: W, entries: &[RunEntry]) -> Result<()> {
    let mut out = BufWriter::new(writer);
    for entry in entries {
        writeln!(out, "{entry}")?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_run_file(path: &Path, entries: &[RunEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    write_run(File::create(path)?, entries)
}
