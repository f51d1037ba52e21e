use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const DEFAULT_K1: f32 = 1.2;
pub const DEFAULT_B: f32 = 0.75;

/// Okapi BM25 with tunable term-frequency saturation (`k1`) and length normalization (`b`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bm25 {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25 {
    fn default() -> Self { Self { k1: DEFAULT_K1, b: DEFAULT_B } }
}

impl Bm25 {
    pub fn new(k1: f32, b: f32) -> Result<Self> {
        let bm25 = Self { k1, b };
        bm25.validate()?;
        Ok(bm25)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.k1.is_finite() && self.k1 > 0.0) {
            return Err(EngineError::invalid("k1", format!("must be > 0, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(EngineError::invalid("b", format!("must be within [0, 1], got {}", self.b)));
        }
        Ok(())
    }

    /// `ln((N - df + 0.5) / (df + 0.5) + 1)`
    pub fn idf(num_docs: u32, df: u32) -> f32 {
        let n = num_docs as f32;
        let df = df as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Saturated, length-normalized term weight, before multiplying by idf.
    pub fn tf_norm(&self, tf: u32, field_len: u32, avg_field_len: f32) -> f32 {
        let tf = tf as f32;
        let len_ratio = if avg_field_len > 0.0 { field_len as f32 / avg_field_len } else { 0.0 };
        (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * len_ratio))
    }

    pub fn score(&self, idf: f32, tf: u32, field_len: u32, avg_field_len: f32) -> f32 {
        if tf == 0 {
            return 0.0;
        }
        idf * self.tf_norm(tf, field_len, avg_field_len)
    }
}

/// Classic smoothed idf used to weight feedback terms: `ln((N + 1) / (df + 1)) + 1`.
pub fn classic_idf(num_docs: u32, df: u32) -> f64 {
    ((num_docs as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0
}
