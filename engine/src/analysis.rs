use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{EngineError, Result};

/// A term together with its token position inside the analyzed text.
pub type Token = (String, usize);

pub const DEFAULT_MIN_GRAM: usize = 3;
pub const DEFAULT_MAX_GRAM: usize = 5;

/// `input` is additionally indexed as `output`. Bidirectional rules also map `output` back to `input`.
#[derive(Debug, Clone, Copy)]
pub struct SynonymRule {
    pub input: &'static str,
    pub output: &'static str,
    pub bidirectional: bool,
}

pub const SYNONYM_RULES: &[SynonymRule] = &[
    SynonymRule { input: "airplane", output: "aircraft", bidirectional: false },
    SynonymRule { input: "aeroplane", output: "aircraft", bidirectional: false },
    SynonymRule { input: "lift", output: "aerodynamic", bidirectional: false },
    SynonymRule { input: "jet", output: "aircraft", bidirectional: false },
    SynonymRule { input: "engine", output: "propulsion", bidirectional: false },
    SynonymRule { input: "rocket", output: "missile", bidirectional: false },
    SynonymRule { input: "wing", output: "airfoil", bidirectional: false },
];

lazy_static! {
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","her","here","hers","herself","him","himself","his","how",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","its","itself",
            "me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","should","shouldn't","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","when","where","which","while","who","whom","why","will","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref SYNONYMS: HashMap<&'static str, Vec<&'static str>> = {
        let mut map: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        for rule in SYNONYM_RULES {
            map.entry(rule.input).or_default().push(rule.output);
            if rule.bidirectional {
                map.entry(rule.output).or_default().push(rule.input);
            }
        }
        map
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Synonyms registered for `term`, in rule order.
pub fn synonyms(term: &str) -> &'static [&'static str] {
    SYNONYMS.get(term).map(|v| v.as_slice()).unwrap_or(&[])
}

fn strip_possessive(word: &str) -> &str {
    word.strip_suffix("'s")
        .or_else(|| word.strip_suffix("\u{2019}s"))
        .unwrap_or(word)
}

/// NFKC-normalized, lower-cased UAX #29 words with possessive suffixes removed, paired with their position.
fn standard_words(text: &str) -> Vec<Token> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    normalized
        .unicode_words()
        .enumerate()
        .filter_map(|(pos, word)| {
            let word = strip_possessive(word);
            if word.is_empty() { None } else { Some((word.to_string(), pos)) }
        })
        .collect()
}

fn ngrams(text: &str, min_gram: usize, max_gram: usize) -> Vec<Token> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut tokens = Vec::new();
    for start in 0..chars.len() {
        for size in min_gram..=max_gram {
            let end = start + size;
            if end > chars.len() { break; }
            let pos = tokens.len();
            tokens.push((chars[start..end].iter().collect(), pos));
        }
    }
    tokens
}

/// Turns raw field text into terms. Every variant is a pure function of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Analyzer {
    /// Word segmentation, possessive stripping, case folding; terms shorter than `min_len` chars are dropped.
    Standard { min_len: usize },
    /// Standard plus stop-word removal and English stemming.
    English,
    /// Whitespace splitting only, case preserved.
    Whitespace,
    /// Every contiguous character n-gram of the lower-cased text.
    NGram { min_gram: usize, max_gram: usize },
    /// Standard plus synonyms stacked at the position of the term they expand.
    Synonym,
}

impl Analyzer {
    pub fn standard() -> Self { Analyzer::Standard { min_len: 1 } }

    pub fn ngram(min_gram: usize, max_gram: usize) -> Result<Self> {
        if min_gram == 0 || max_gram < min_gram {
            return Err(EngineError::InvalidNgramRange { min: min_gram, max: max_gram });
        }
        Ok(Analyzer::NGram { min_gram, max_gram })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Analyzer::Standard { .. } => "standard",
            Analyzer::English => "english",
            Analyzer::Whitespace => "whitespace",
            Analyzer::NGram { .. } => "ngram",
            Analyzer::Synonym => "synonym",
        }
    }

    /// Analyze `text` into (term, position) pairs, positions ascending.
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        match *self {
            Analyzer::Standard { min_len } => standard_words(text)
                .into_iter()
                .filter(|(w, _)| w.chars().count() >= min_len)
                .collect(),
            Analyzer::English => standard_words(text)
                .into_iter()
                .filter(|(w, _)| !is_stopword(w))
                .map(|(w, pos)| (STEMMER.stem(&w).to_string(), pos))
                .collect(),
            Analyzer::Whitespace => text
                .split_whitespace()
                .enumerate()
                .map(|(pos, w)| (w.to_string(), pos))
                .collect(),
            Analyzer::NGram { min_gram, max_gram } => ngrams(text, min_gram, max_gram),
            Analyzer::Synonym => {
                let mut tokens = Vec::new();
                for (word, pos) in standard_words(text) {
                    let expansions = synonyms(&word);
                    tokens.push((word, pos));
                    tokens.extend(expansions.iter().map(|syn| (syn.to_string(), pos)));
                }
                tokens
            }
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self { Analyzer::standard() }
}

impl FromStr for Analyzer {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Analyzer::standard()),
            "english" => Ok(Analyzer::English),
            "whitespace" => Ok(Analyzer::Whitespace),
            "ngram" => Analyzer::ngram(DEFAULT_MIN_GRAM, DEFAULT_MAX_GRAM),
            "synonym" => Ok(Analyzer::Synonym),
            _ => Err(EngineError::UnknownAnalyzer(s.to_string())),
        }
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analyzer::NGram { min_gram, max_gram } => write!(f, "ngram({min_gram},{max_gram})"),
            Analyzer::Standard { min_len } if *min_len > 1 => write!(f, "standard(min_len={min_len})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Analyzer assignment per field. Fields without an explicit entry use the default analyzer.
///
/// The index stores the mapping it was built with and the query side reads it back from there, so a
/// field is always analyzed the same way at index time and at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnalyzers {
    default: Analyzer,
    per_field: BTreeMap<String, Analyzer>,
}

impl FieldAnalyzers {
    pub fn new(default: Analyzer) -> Self {
        Self { default, per_field: BTreeMap::new() }
    }

    pub fn with_field(mut self, field: &str, analyzer: Analyzer) -> Self {
        self.per_field.insert(field.to_string(), analyzer);
        self
    }

    /// Build from analyzer names. An unknown default is fatal; an unknown per-field name falls back to the
    /// default analyzer for that field.
    pub fn from_names<'a, I>(default: &str, per_field: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Ok(Self::new(default.parse()?).with_field_names(per_field))
    }

    /// Replace the default analyzer, keeping explicit per-field entries.
    pub fn with_default(mut self, default: Analyzer) -> Self {
        self.default = default;
        self
    }

    /// Assign analyzers by name. Unknown names are skipped with a warning, leaving the field on the default.
    pub fn with_field_names<'a, I>(mut self, per_field: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (field, name) in per_field {
            match name.parse::<Analyzer>() {
                Ok(analyzer) => self = self.with_field(field, analyzer),
                Err(err) => {
                    tracing::warn!(field, %err, fallback = %self.default, "using field default analyzer");
                }
            }
        }
        self
    }

    pub fn default_analyzer(&self) -> Analyzer { self.default }

    pub fn analyzer(&self, field: &str) -> Analyzer {
        self.per_field.get(field).copied().unwrap_or(self.default)
    }

    pub fn tokenize(&self, field: &str, text: &str) -> Vec<Token> {
        self.analyzer(field).analyze(text)
    }
}

impl Default for FieldAnalyzers {
    fn default() -> Self { Self::new(Analyzer::English) }
}

impl fmt::Display for FieldAnalyzers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "default={}", self.default)?;
        for (field, analyzer) in &self.per_field {
            write!(f, " {field}={analyzer}")?;
        }
        Ok(())
    }
}
