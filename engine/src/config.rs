use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::analysis::{Analyzer, FieldAnalyzers, DEFAULT_MAX_GRAM, DEFAULT_MIN_GRAM};
use crate::document::TITLE;
use crate::error::{EngineError, Result};
use crate::rocchio::RocchioParams;
use crate::search::DEFAULT_TOP_K;
use crate::similarity::Bm25;

/// Retrieval pipeline of an experiment. Each strategy also fixes the analyzers its index is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// English analysis, BM25 over `content`.
    Baseline,
    /// Same as baseline; the run tag carries k1 and b.
    Bm25,
    /// Weighted sum of independent `title` and `content` BM25 scores.
    FieldBoost,
    /// Character n-grams on `title`, standard words elsewhere; both fields are queried.
    Ngram,
    /// Synonym-expanding analysis on every field.
    Synonym,
    /// Pseudo-relevance feedback expansion, then a second retrieval.
    Rocchio,
    /// Rocchio retrieval re-ranked by title match.
    Rerank,
}

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::Baseline,
        Strategy::Bm25,
        Strategy::FieldBoost,
        Strategy::Ngram,
        Strategy::Synonym,
        Strategy::Rocchio,
        Strategy::Rerank,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Baseline => "baseline",
            Strategy::Bm25 => "bm25",
            Strategy::FieldBoost => "field-boost",
            Strategy::Ngram => "ngram",
            Strategy::Synonym => "synonym",
            Strategy::Rocchio => "rocchio",
            Strategy::Rerank => "rerank",
        }
    }

    /// Analyzer profile the strategy's index must be built with.
    pub fn analyzers(&self) -> FieldAnalyzers {
        match self {
            Strategy::Ngram => FieldAnalyzers::new(Analyzer::standard()).with_field(
                TITLE,
                Analyzer::NGram { min_gram: DEFAULT_MIN_GRAM, max_gram: DEFAULT_MAX_GRAM },
            ),
            Strategy::Synonym => FieldAnalyzers::new(Analyzer::Synonym),
            _ => FieldAnalyzers::new(Analyzer::English),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self { Strategy::Baseline }
}

impl FromStr for Strategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|st| st.name() == wanted)
            .ok_or_else(|| EngineError::UnknownStrategy(s.to_string()))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldBoost {
    pub title: f32,
    pub body: f32,
}

impl Default for FieldBoost {
    fn default() -> Self { Self { title: 2.0, body: 1.0 } }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RerankParams {
    /// Weight of the title-match score added to the base score.
    pub boost: f32,
    /// Depth of the base retrieval that gets re-ranked.
    pub top_n: usize,
}

impl Default for RerankParams {
    fn default() -> Self { Self { boost: 0.5, top_n: 1000 } }
}

/// Every tunable of one experiment. Missing keys take their defaults; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub strategy: Strategy,
    /// Analyzer name replacing the strategy profile's default analyzer; per-field entries are kept.
    pub analyzer: Option<String>,
    pub bm25: Bm25,
    pub field_boost: FieldBoost,
    pub rocchio: RocchioParams,
    pub rerank: RerankParams,
    pub top_k: usize,
    /// Overrides the generated run tag.
    pub run_tag: Option<String>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            analyzer: None,
            bm25: Bm25::default(),
            field_boost: FieldBoost::default(),
            rocchio: RocchioParams::default(),
            rerank: RerankParams::default(),
            top_k: DEFAULT_TOP_K,
            run_tag: None,
        }
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::invalid(name, format!("must be >= 0, got {value}")))
    }
}

impl ExperimentConfig {
    pub fn for_strategy(strategy: Strategy) -> Self {
        Self { strategy, ..Default::default() }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Per-field analyzers an index must be built with to serve this configuration.
    pub fn analyzers(&self) -> Result<FieldAnalyzers> {
        let profile = self.strategy.analyzers();
        match &self.analyzer {
            Some(name) => Ok(profile.with_default(name.parse()?)),
            None => Ok(profile),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.analyzers()?;
        self.bm25.validate()?;
        self.rocchio.validate()?;
        non_negative("field_boost.title", self.field_boost.title)?;
        non_negative("field_boost.body", self.field_boost.body)?;
        non_negative("rerank.boost", self.rerank.boost)?;
        if self.rerank.top_n == 0 {
            return Err(EngineError::invalid("rerank.top_n", "must be > 0"));
        }
        if self.top_k == 0 {
            return Err(EngineError::invalid("top_k", "must be > 0"));
        }
        Ok(())
    }

    /// Baseline is tagged by its analyzer. Other strategies get an `_<analyzer>` suffix when the analyzer
    /// differs from their profile's default.
    pub fn run_tag(&self) -> String {
        if let Some(tag) = &self.run_tag {
            return tag.clone();
        }
        let profile_default = self.strategy.analyzers().default_analyzer();
        let analyzer = self
            .analyzer
            .as_deref()
            .and_then(|name| name.parse::<Analyzer>().ok())
            .unwrap_or(profile_default);
        let tag = match self.strategy {
            Strategy::Baseline => return format!("run_{}", analyzer.name()),
            Strategy::Bm25 => format!("run_bm25_{}_{}", self.bm25.k1, self.bm25.b),
            Strategy::FieldBoost => format!("run_fields_{}_{}", self.field_boost.title, self.field_boost.body),
            Strategy::Ngram => "run_ngram".to_string(),
            Strategy::Synonym => "run_synonym".to_string(),
            Strategy::Rocchio => "run_rocchio".to_string(),
            Strategy::Rerank => "run_rerank_rocchio".to_string(),
        };
        if analyzer == profile_default {
            tag
        } else {
            format!("{tag}_{}", analyzer.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_round_trip() {
        for st in Strategy::ALL {
            assert_eq!(st.name().parse::<Strategy>().unwrap(), st);
        }
        assert!(matches!("tfidf".parse::<Strategy>(), Err(EngineError::UnknownStrategy(_))));
    }

    #[test]
    fn json_fills_defaults() {
        let config = ExperimentConfig::from_json(r#"{"strategy": "bm25", "bm25": {"k1": 1.5}}"#).unwrap();
        assert_eq!(config.strategy, Strategy::Bm25);
        assert_eq!(config.bm25, Bm25 { k1: 1.5, b: 0.75 });
        assert_eq!(config.top_k, 1000);
        assert_eq!(config.run_tag(), "run_bm25_1.5_0.75");
    }

    #[test]
    fn unknown_parameter_names_are_fatal() {
        assert!(ExperimentConfig::from_json(r#"{"bm25": {"k3": 1.0}}"#).is_err());
        assert!(ExperimentConfig::from_json(r#"{"strategy": "tfidf"}"#).is_err());
    }

    #[test]
    fn out_of_range_values_are_fatal() {
        assert!(ExperimentConfig::from_json(r#"{"bm25": {"b": 1.2}}"#).is_err());
        assert!(ExperimentConfig::from_json(r#"{"rocchio": {"feedback_docs": 0}}"#).is_err());
        assert!(ExperimentConfig::from_json(r#"{"field_boost": {"title": -1.0}}"#).is_err());
        assert!(ExperimentConfig::from_json(r#"{"top_k": 0}"#).is_err());
    }

    #[test]
    fn explicit_run_tag_wins() {
        let config = ExperimentConfig { run_tag: Some("mine".into()), ..ExperimentConfig::for_strategy(Strategy::Rerank) };
        assert_eq!(config.run_tag(), "mine");
        assert_eq!(ExperimentConfig::for_strategy(Strategy::Rerank).run_tag(), "run_rerank_rocchio");
    }

    #[test]
    fn analyzer_choice_shapes_profile_and_tag() {
        let config = ExperimentConfig::from_json(r#"{"analyzer": "standard"}"#).unwrap();
        assert_eq!(config.analyzers().unwrap(), FieldAnalyzers::new(Analyzer::standard()));
        assert_eq!(config.run_tag(), "run_standard");
        assert_eq!(ExperimentConfig::default().run_tag(), "run_english");

        let config = ExperimentConfig { analyzer: Some("whitespace".into()), ..ExperimentConfig::for_strategy(Strategy::Bm25) };
        assert_eq!(config.run_tag(), "run_bm25_1.2_0.75_whitespace");
        let config = ExperimentConfig { analyzer: Some("english".into()), ..ExperimentConfig::for_strategy(Strategy::Rocchio) };
        assert_eq!(config.run_tag(), "run_rocchio");

        let ngram = ExperimentConfig { analyzer: Some("english".into()), ..ExperimentConfig::for_strategy(Strategy::Ngram) };
        let profile = ngram.analyzers().unwrap();
        assert_eq!(profile.default_analyzer(), Analyzer::English);
        assert_eq!(profile.analyzer(TITLE), Analyzer::NGram { min_gram: 3, max_gram: 5 });
        assert_eq!(ngram.run_tag(), "run_ngram_english");
    }

    #[test]
    fn unknown_analyzer_name_is_fatal() {
        assert!(matches!(
            ExperimentConfig::from_json(r#"{"analyzer": "porter"}"#),
            Err(EngineError::UnknownAnalyzer(_))
        ));
    }
}
