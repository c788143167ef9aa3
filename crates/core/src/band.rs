use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One inclusive facial-geometry ratio interval mapped to a representative age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    /// Label used in logs and audit detail.
    pub label: String,
    /// Inclusive lower bound for the geometry ratio.
    pub min_ratio: f32,
    /// Inclusive upper bound for the geometry ratio.
    pub max_ratio: f32,
    /// Age assigned when the ratio falls in this band.
    pub age: f32,
}

impl AgeBand {
    #[must_use]
    pub fn new(label: impl Into<String>, min_ratio: f32, max_ratio: f32, age: f32) -> Self {
        Self {
            label: label.into(),
            min_ratio,
            max_ratio,
            age,
        }
    }

    /// Whether a ratio falls inside this band. Bounds are inclusive.
    #[must_use]
    pub fn contains(&self, ratio: f32) -> bool {
        ratio >= self.min_ratio && ratio <= self.max_ratio
    }
}

/// Ordered lookup table from geometry ratio to estimated age.
///
/// Bands are checked in declaration order and the first match wins, so
/// shared boundaries resolve to the earlier band. Ratios outside every band
/// fall back to `default_age`. The table is operator-replaceable policy, not
/// a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTable {
    #[serde(default = "default_bands")]
    bands: Vec<AgeBand>,
    #[serde(default = "default_age")]
    default_age: f32,
}

impl BandTable {
    #[must_use]
    pub fn new(bands: Vec<AgeBand>, default_age: f32) -> Self {
        Self { bands, default_age }
    }

    /// Map a geometry ratio to an estimated age.
    #[must_use]
    pub fn age_for_ratio(&self, ratio: f32) -> f32 {
        for band in &self.bands {
            if band.contains(ratio) {
                return band.age;
            }
        }
        self.default_age
    }

    /// Label of the band a ratio falls into, for audit detail.
    #[must_use]
    pub fn band_label(&self, ratio: f32) -> Option<&str> {
        self.bands
            .iter()
            .find(|band| band.contains(ratio))
            .map(|band| band.label.as_str())
    }

    /// Age used when no band matches.
    #[must_use]
    pub fn default_age(&self) -> f32 {
        self.default_age
    }

    /// Check every band has finite, ordered bounds and a plausible age.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for band in &self.bands {
            if !band.min_ratio.is_finite() || !band.max_ratio.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "band '{}' has non-finite ratio bounds",
                    band.label
                )));
            }
            if band.min_ratio > band.max_ratio {
                return Err(ConfigError::Invalid(format!(
                    "band '{}' has min_ratio {} above max_ratio {}",
                    band.label, band.min_ratio, band.max_ratio
                )));
            }
            if !band.age.is_finite() || band.age <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "band '{}' has invalid age {}",
                    band.label, band.age
                )));
            }
        }
        if !self.default_age.is_finite() || self.default_age <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "default band age {} is invalid",
                self.default_age
            )));
        }
        Ok(())
    }
}

impl Default for BandTable {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            default_age: default_age(),
        }
    }
}

fn default_bands() -> Vec<AgeBand> {
    vec![
        AgeBand::new("child", 0.75, 0.85, 10.0),
        AgeBand::new("teen", 0.85, 0.95, 15.0),
        AgeBand::new("adult", 0.95, 1.1, 20.0),
    ]
}

fn default_age() -> f32 {
    20.0
}
