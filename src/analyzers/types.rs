//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzers::rebalance::RatingChange;
use crate::listing::Listing;
use crate::rating::Rating;
use crate::validators::sanitizer::Rejection;

/// Minimum, maximum, and mean of a numeric field over a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Share of block members that carry each field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Completeness {
    pub price: f64,
    pub area: f64,
    pub rating: f64,
    pub floor: f64,
    pub rooms: f64,
}

impl Completeness {
    pub fn mean(&self) -> f64 {
        (self.price + self.area + self.rating + self.floor + self.rooms) / 5.0
    }
}

/// Statistics for one city block, computed once when the block is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockStats {
    pub member_count: usize,
    pub total_area: f64,
    pub weighted_median_rating: Rating,
    pub rating_histogram: BTreeMap<Rating, usize>,
    pub price: RangeStats,
    pub area: RangeStats,
    pub avg_price_per_area: f64,
    pub completeness: Completeness,
    pub confidence_score: f64,
}

/// A city block: its members and their statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: String,
    #[serde(skip)]
    pub listings: Vec<Listing>,
    #[serde(flatten)]
    pub stats: BlockStats,
}

/// Observed against expected share for one grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeShare {
    pub rating: Rating,
    pub observed: f64,
    pub expected: f64,
}

/// How far a pool's rating mix sits from the reference distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistributionDeviation {
    pub grades: Vec<GradeShare>,
    /// Half the sum of absolute share differences: 0 is identical, 1 disjoint.
    pub total_variation: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub raw_listings: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub acceptance_rate: f64,
    pub rating_changes: usize,
    pub blocks_analyzed: usize,
    pub listings_in_blocks: usize,
    pub total_area: f64,
    pub average_confidence: f64,
}

/// Complete result of running the pipeline over one area.
#[derive(Debug, Clone, Serialize)]
pub struct AreaReport {
    pub area_name: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub blocks: Vec<Block>,
    pub overall_distribution: BTreeMap<Rating, usize>,
    pub distribution_deviation: DistributionDeviation,
    pub rejections: Vec<Rejection>,
    pub rating_changes: Vec<RatingChange>,
}
