//! Quality-score tuning, optionally loaded from a TOML file.
//!
//! ```toml
//! [scoring]
//! target_minutes_per_item = 2.0
//! fast_bonus = 0.2
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level TOML wrapper.
#[derive(Debug, Deserialize)]
struct ScoringFile {
    scoring: ScoringConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Expected operator time per validated sub-record.
    pub target_minutes_per_item: f64,
    /// Bonus fraction granted at zero elapsed time, scaled linearly to 0 at target.
    pub fast_bonus: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            target_minutes_per_item: 2.0,
            fast_bonus: 0.2,
        }
    }
}

impl ScoringConfig {
    /// Read a `[scoring]` table from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read scoring config {}: {e}", path.display()))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("bad scoring config {}: {e}", path.display())))
    }

    fn parse(content: &str) -> Result<Self> {
        let file: ScoringFile =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        file.scoring.validate()
    }

    fn validate(self) -> Result<Self> {
        if !(self.target_minutes_per_item.is_finite() && self.target_minutes_per_item > 0.0) {
            return Err(Error::Config(format!(
                "target_minutes_per_item must be positive, got {}",
                self.target_minutes_per_item
            )));
        }
        if !(self.fast_bonus.is_finite() && self.fast_bonus >= 0.0) {
            return Err(Error::Config(format!(
                "fast_bonus must be non-negative, got {}",
                self.fast_bonus
            )));
        }
        Ok(self)
    }
}
