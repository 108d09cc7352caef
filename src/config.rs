//! Pipeline configuration.
//!
//! Every knob has a default, so a config file only needs the fields it
//! overrides:
//! ```json
//! {
//!   "validation": { "max_price": 3000000 },
//!   "rebalance": { "dominance_threshold": 0.35, "shuffle_seed": 7 },
//!   "blocks": { "min_block_size": 8 }
//! }
//! ```
//! [`PipelineConfig::validate`] rejects inconsistent settings before any
//! listing is processed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::rating::Rating;

/// Tolerance allowed when checking that the reference shares sum to 1.0.
const DISTRIBUTION_TOLERANCE: f64 = 0.01;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} bounds are inverted: min {min} > max {max}")]
    InvertedBounds {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("reference distribution sums to {0:.3}, expected 1.0")]
    DistributionSum(f64),
    #[error("reference distribution has a negative share {share} for {rating}")]
    NegativeShare { rating: Rating, share: f64 },
    #[error("dominance threshold must be in (0, 1], got {0}")]
    DominanceThreshold(f64),
    #[error("sanitized confidence must be in [0, 1], got {0}")]
    SanitizedConfidence(f64),
    #[error("confidence thresholds must satisfy high >= medium >= 1, got high {high}, medium {medium}")]
    ConfidenceThresholds { high: i32, medium: i32 },
    #[error("{0} must not be empty")]
    EmptyList(&'static str),
    #[error("block sizes invalid: min {min}, target {target}")]
    BlockSize { min: usize, target: usize },
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What to do when price and area are each plausible but their ratio is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioPolicy {
    #[default]
    Reject,
    /// Keep the listing but drop its area.
    ClearArea,
}

/// Plausibility bounds for price, area, and price per m². All inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_price: f64,
    pub max_price: f64,
    pub min_area: f64,
    pub max_area: f64,
    pub min_ratio: f64,
    pub max_ratio: f64,
    pub ratio_policy: RatioPolicy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_price: 50.0,
            max_price: 5_000_000.0,
            min_area: 10.0,
            max_area: 500.0,
            min_ratio: 100.0,
            max_ratio: 8_000.0,
            ratio_policy: RatioPolicy::Reject,
        }
    }
}

/// Weights and keyword lists for the rating confidence heuristic.
///
/// These are tunable policy, not a calibrated classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub exact_label_points: i32,
    pub keyword_points: i32,
    pub worse_grade_points: i32,
    pub premium_points: i32,
    pub default_penalty: i32,
    /// Price per m² above which a best-in-class rating is believable.
    pub premium_ratio: f64,
    /// The default penalty only applies to descriptions longer than this.
    pub penalty_min_description: usize,
    pub high_threshold: i32,
    pub medium_threshold: i32,
    pub rating_keywords: Vec<String>,
    pub renovation_keywords: Vec<String>,
    pub worse_grades: Vec<Rating>,
    pub best_grades: Vec<Rating>,
    /// The grade most often emitted as a hard-coded default by listing sites.
    pub suspect_default: Rating,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            exact_label_points: 3,
            keyword_points: 1,
            worse_grade_points: 1,
            premium_points: 1,
            default_penalty: 1,
            premium_ratio: 1_500.0,
            penalty_min_description: 50,
            high_threshold: 3,
            medium_threshold: 1,
            rating_keywords: strings(&[
                "energy",
                "class",
                "rating",
                "certificate",
                "efficient",
                "ενεργ",
                "κλάση",
                "ενεργειακ",
                "πιστοποιητικ",
            ]),
            renovation_keywords: strings(&[
                "renovat", "new", "modern", "recent", "ανακαιν", "νεόδμητ",
            ]),
            worse_grades: vec![Rating::D, Rating::E, Rating::F],
            best_grades: vec![Rating::APlus, Rating::A],
            suspect_default: Rating::A,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    pub min_quality_score: u32,
    pub min_description_len: usize,
    /// A listing is eligible only if one of its flags contains a marker.
    pub verified_source_markers: Vec<String>,
    pub sanitized_confidence: f64,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            min_quality_score: 3,
            min_description_len: 10,
            verified_source_markers: strings(&["verified_source"]),
            sanitized_confidence: 0.85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// At or above this many distinct grades the batch is left alone.
    pub diversity_threshold: usize,
    /// Share of rated listings above which a grade counts as dominant.
    pub dominance_threshold: f64,
    /// Listings of a dominant grade that keep their rating.
    pub keep_dominant: usize,
    pub fallback_grades: Vec<Rating>,
    /// Repeating sequence handed out to listings without a rating.
    pub assignment_cycle: Vec<Rating>,
    /// When set, the kept dominant listings are picked by a seeded shuffle
    /// instead of input order.
    pub shuffle_seed: Option<u64>,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            diversity_threshold: 3,
            dominance_threshold: 0.4,
            keep_dominant: 3,
            fallback_grades: vec![Rating::C, Rating::D],
            assignment_cycle: vec![
                Rating::C,
                Rating::D,
                Rating::C,
                Rating::B,
                Rating::D,
                Rating::E,
                Rating::C,
                Rating::D,
            ],
            shuffle_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub min_block_size: usize,
    pub target_block_size: usize,
    /// Number of blocks to build. Derived from the pool size when unset.
    pub target_blocks: Option<usize>,
    /// Reported when a block has no listing with both a rating and an area.
    pub default_rating: Rating,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            min_block_size: 10,
            target_block_size: 15,
            target_blocks: None,
            default_rating: Rating::C,
        }
    }
}

/// Expected population share per grade, based on the Athens building stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceDistribution(BTreeMap<Rating, f64>);

impl Default for ReferenceDistribution {
    fn default() -> Self {
        Self::new([
            (Rating::APlus, 0.03),
            (Rating::A, 0.07),
            (Rating::B, 0.12),
            (Rating::C, 0.35),
            (Rating::D, 0.30),
            (Rating::E, 0.10),
            (Rating::F, 0.03),
        ])
    }
}

impl ReferenceDistribution {
    pub fn new(shares: impl IntoIterator<Item = (Rating, f64)>) -> Self {
        Self(shares.into_iter().collect())
    }

    /// Expected share for `rating`; grades missing from the table expect 0.
    pub fn expected(&self, rating: Rating) -> f64 {
        self.0.get(&rating).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rating, f64)> + '_ {
        self.0.iter().map(|(r, s)| (*r, *s))
    }

    /// Grades ordered from most to least expected; ties keep scale order.
    pub fn by_expected_share(&self) -> Vec<Rating> {
        let mut grades: Vec<Rating> = self.0.keys().copied().collect();
        grades.sort_by(|a, b| self.expected(*b).total_cmp(&self.expected(*a)).then(a.cmp(b)));
        grades
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some((rating, share)) = self.iter().find(|(_, s)| *s < 0.0) {
            return Err(ConfigError::NegativeShare { rating, share });
        }
        let total = self.total();
        if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(ConfigError::DistributionSum(total));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub validation: ValidationConfig,
    pub confidence: ConfidenceConfig,
    pub sanitizer: SanitizerConfig,
    pub rebalance: RebalanceConfig,
    pub blocks: BlockConfig,
    pub reference_distribution: ReferenceDistribution,
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path` and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.validation;
        check_bounds("price", v.min_price, v.max_price)?;
        check_bounds("area", v.min_area, v.max_area)?;
        check_bounds("price per m²", v.min_ratio, v.max_ratio)?;

        let c = &self.confidence;
        if c.medium_threshold < 1 || c.high_threshold < c.medium_threshold {
            return Err(ConfigError::ConfidenceThresholds {
                high: c.high_threshold,
                medium: c.medium_threshold,
            });
        }

        let s = &self.sanitizer;
        if s.verified_source_markers.is_empty() {
            return Err(ConfigError::EmptyList("verified_source_markers"));
        }
        if !(0.0..=1.0).contains(&s.sanitized_confidence) {
            return Err(ConfigError::SanitizedConfidence(s.sanitized_confidence));
        }

        let r = &self.rebalance;
        if !(r.dominance_threshold > 0.0 && r.dominance_threshold <= 1.0) {
            return Err(ConfigError::DominanceThreshold(r.dominance_threshold));
        }
        if r.fallback_grades.is_empty() {
            return Err(ConfigError::EmptyList("fallback_grades"));
        }
        if r.assignment_cycle.is_empty() {
            return Err(ConfigError::EmptyList("assignment_cycle"));
        }

        let b = &self.blocks;
        if b.min_block_size == 0 || b.target_block_size < b.min_block_size {
            return Err(ConfigError::BlockSize {
                min: b.min_block_size,
                target: b.target_block_size,
            });
        }

        self.reference_distribution.validate()
    }
}

fn check_bounds(field: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(min > 0.0) {
        return Err(ConfigError::NonPositive { field, value: min });
    }
    if min > max {
        return Err(ConfigError::InvertedBounds { field, min, max });
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
