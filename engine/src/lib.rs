//! Ad-hoc retrieval engine for test-collection experiments: per-field inverted index, BM25 ranking,
//! Rocchio pseudo-relevance feedback, title-boost re-ranking and TREC run output.

pub mod analysis;
pub mod builder;
pub mod config;
pub mod cranfield;
pub mod document;
pub mod error;
pub mod experiment;
pub mod index;
pub mod persist;
pub mod query;
pub mod rerank;
pub mod rocchio;
pub mod run;
pub mod search;
pub mod similarity;

pub use analysis::{Analyzer, FieldAnalyzers};
pub use config::{ExperimentConfig, Strategy};
pub use document::Document;
pub use error::{EngineError, Result};
pub use experiment::Experiment;
pub use index::{DocId, FieldIndex, InvertedIndex, Posting, TermId};
pub use query::{Query, QueryNode, TermClause};
pub use run::RunEntry;
pub use search::{ScoredDoc, Searcher};
pub use similarity::Bm25;
