use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Index construction needs at least one document.
    #[error("cannot build an index from an empty collection")]
    EmptyCollection,

    #[error("duplicate document id `{0}`")]
    DuplicateDocument(String),

    #[error("unknown analyzer `{0}` (expected one of: standard, english, whitespace, ngram, synonym)")]
    UnknownAnalyzer(String),

    #[error("unknown strategy `{0}`")]
    UnknownStrategy(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("index was analyzed with `{found}` but the experiment expects `{expected}`")]
    AnalyzerMismatch { expected: String, found: String },

    #[error("invalid n-gram range {min}..={max}")]
    InvalidNgramRange { min: usize, max: usize },

    #[error("unsupported index version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] bincode::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter { name, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
