//! Readers for the Cranfield collection (`cran.all.1400`), its queries (`cran.qry`) and relevance
//! judgments (`cranqrel`).
//!
//! Records start with `.I <id>`; sections are introduced by `.T` (title), `.A` (author),
//! `.B` (bibliography) and `.W` (body) on their own line.

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::document::{Document, AUTHOR, CONTENT, TITLE};
use crate::error::Result;

pub const COLLECTION_FILE: &str = "cran.all.1400";
pub const QUERIES_FILE: &str = "cran.qry";
pub const QRELS_FILES: [&str; 2] = ["qrels", "cranqrel"];

/// Stored-only field holding the `.B` section.
pub const BIBLIO: &str = "biblio";

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"^\.([ITABW])\b\s*(.*)$").expect("valid regex");
}

#[derive(Default)]
struct Record {
    id: String,
    title: Vec<String>,
    author: Vec<String>,
    biblio: Vec<String>,
    body: Vec<String>,
}

impl Record {
    fn section(&mut self, marker: char) -> Option<&mut Vec<String>> {
        match marker {
            'T' => Some(&mut self.title),
            'A' => Some(&mut self.author),
            'B' => Some(&mut self.biblio),
            'W' => Some(&mut self.body),
            _ => None,
        }
    }
}

fn join_lines(lines: &[String], sep: &str) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn parse_records(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Option<Record> = None;
    let mut section: Option<char> = None;
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(caps) = MARKER.captures(line.trim_start()) {
            let marker = caps[1].chars().next().unwrap_or('W');
            let rest = caps[2].trim().to_string();
            if marker == 'I' {
                records.extend(current.take());
                current = Some(Record { id: rest, ..Default::default() });
                section = None;
            } else {
                section = Some(marker);
                if let (Some(record), false) = (current.as_mut(), rest.is_empty()) {
                    if let Some(lines) = record.section(marker) {
                        lines.push(rest);
                    }
                }
            }
            continue;
        }
        if let (Some(record), Some(marker)) = (current.as_mut(), section) {
            if let Some(lines) = record.section(marker) {
                lines.push(line.to_string());
            }
        }
    }
    records.extend(current);
    records
}

/// Parse a collection file into documents in file order. Missing sections become missing fields.
pub fn parse_collection(text: &str) -> Vec<Document> {
    parse_records(text)
        .into_iter()
        .filter(|r| !r.id.is_empty())
        .map(|r| {
            let mut doc = Document::new(r.id);
            for (field, lines) in [(TITLE, &r.title), (AUTHOR, &r.author), (BIBLIO, &r.biblio), (CONTENT, &r.body)] {
                if !lines.is_empty() {
                    doc = doc.with_field(field, join_lines(lines, "\n"));
                }
            }
            doc
        })
        .collect()
}

/// Parse a query file. Ids are assigned 1, 2, 3, ... in file order, which is the numbering the
/// relevance judgments use; the `.I` numbers in the file are not contiguous.
pub fn parse_queries(text: &str) -> Vec<(u32, String)> {
    parse_records(text)
        .into_iter()
        .enumerate()
        .map(|(i, r)| (i as u32 + 1, join_lines(&r.body, " ")))
        .collect()
}

/// Normalize judgment lines to `qid 0 docno rel`. Accepts `qid docno rel` and `qid iter docno rel`.
pub fn parse_qrels(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.len() {
                3 => Some(format!("{} 0 {} {}", parts[0], parts[1], parts[2])),
                n if n >= 4 => Some(format!("{} 0 {} {}", parts[0], parts[2], parts[3])),
                _ => None,
            }
        })
        .collect()
}

/// `path` itself when it is a file, otherwise the first of `names` that exists inside it.
fn resolve(path: &Path, names: &[&str]) -> io::Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    names
        .iter()
        .map(|name| path.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("missing {} in {}", names.join(" or "), path.display()),
            )
        })
}

pub fn load_collection(path: &Path) -> Result<Vec<Document>> {
    let text = fs::read_to_string(resolve(path, &[COLLECTION_FILE])?)?;
    Ok(parse_collection(&text))
}

pub fn load_queries(path: &Path) -> Result<Vec<(u32, String)>> {
    let text = fs::read_to_string(resolve(path, &[QUERIES_FILE])?)?;
    Ok(parse_queries(&text))
}

pub fn load_qrels(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(resolve(path, &QRELS_FILES)?)?;
    Ok(parse_qrels(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = ".I 1
.T
experimental investigation of the aerodynamics of a
wing in a slipstream .
.A
brenckman,m.
.B
j. ae. scs. 25, 1958, 324.
.W
experimental investigation of the aerodynamics of a
wing in a slipstream .
.I 2
.T
simple shear flow past a flat plate .
.A
ting-yili
.W
simple shear flow past a flat plate in an incompressible fluid .
.I 3
.W
body only
";

    #[test]
    fn parses_documents_with_sections() {
        let docs = parse_collection(COLLECTION);
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].id, "1");
        assert_eq!(docs[0].title(), "experimental investigation of the aerodynamics of a\nwing in a slipstream .");
        assert_eq!(docs[0].field(AUTHOR), "brenckman,m.");
        assert_eq!(docs[0].field(BIBLIO), "j. ae. scs. 25, 1958, 324.");
        assert_eq!(docs[1].field(BIBLIO), "");
        assert_eq!(docs[2].title(), "");
        assert_eq!(docs[2].content(), "body only");
    }

    #[test]
    fn queries_are_numbered_sequentially() {
        let text = ".I 001\n.W\nwhat similarity laws must be obeyed\nwhen constructing models ?\n.I 004\n.W\n???\n";
        let queries = parse_queries(text);
        assert_eq!(
            queries,
            vec![
                (1, "what similarity laws must be obeyed when constructing models ?".to_string()),
                (2, "???".to_string()),
            ]
        );
    }

    #[test]
    fn qrels_are_normalized() {
        let lines = parse_qrels("1 184 2\n\n1 0 29 -1\nbad\n");
        assert_eq!(lines, vec!["1 0 184 2", "1 0 29 -1"]);
    }

    #[test]
    fn handles_crlf_input() {
        let docs = parse_collection(".I 9\r\n.T\r\nshock\r\n.W\r\nwaves\r\n");
        assert_eq!(docs[0].title(), "shock");
        assert_eq!(docs[0].content(), "waves");
    }
}
