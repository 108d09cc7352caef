//! End-to-end driver: sanitize, rebalance, partition, aggregate.
//!
//! Each stage consumes the full output of the previous one. Per-listing
//! problems never abort a run; only an invalid configuration does, and that
//! is caught when the [`Pipeline`] is built.

use chrono::Utc;
use tracing::{info, warn};

use crate::analyzers::aggregate::{aggregate_block, distribution_deviation};
use crate::analyzers::partition::partition;
use crate::analyzers::rebalance::rebalance;
use crate::analyzers::types::{AreaReport, ReportSummary};
use crate::analyzers::utility::{histogram, mean};
use crate::config::{ConfigError, PipelineConfig};
use crate::listing::{Listing, RawListing};
use crate::validators::sanitizer::sanitize_batch;

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validates `config` up front so a run can never start with
    /// inconsistent bounds or a malformed reference distribution.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Block count to aim for: the configured value, or one block per
    /// `target_block_size` listings.
    pub fn target_blocks(&self, pool_size: usize) -> usize {
        self.config
            .blocks
            .target_blocks
            .unwrap_or_else(|| (pool_size / self.config.blocks.target_block_size).max(1))
    }

    /// Runs every stage over `raw` and returns the area report, including
    /// the rejected listings and every rating change made along the way.
    #[tracing::instrument(skip(self, raw), fields(area = %area_name, raw = raw.len()))]
    pub fn run(&self, area_name: &str, raw: Vec<RawListing>) -> AreaReport {
        let raw_count = raw.len();
        if raw_count == 0 {
            warn!("Empty listing batch");
        }

        let sanitized = sanitize_batch(raw.into_iter().map(Listing::from), &self.config);
        let acceptance_rate = sanitized.acceptance_rate();

        let rebalanced = rebalance(
            sanitized.accepted,
            &self.config.rebalance,
            &self.config.reference_distribution,
        );
        let pool = rebalanced.listings;

        let overall_distribution = histogram(&pool);
        let deviation = distribution_deviation(&pool, &self.config.reference_distribution);
        info!(
            total_variation = deviation.total_variation,
            "Distance from reference distribution"
        );

        let accepted = pool.len();
        let target_blocks = self.target_blocks(accepted);
        let blocks: Vec<_> = partition(pool, target_blocks, self.config.blocks.min_block_size)
            .into_iter()
            .enumerate()
            .map(|(i, members)| {
                let id = format!("{}_CityBlock_{:02}", area_name, i + 1);
                aggregate_block(id, members, self.config.blocks.default_rating)
            })
            .collect();

        for block in &blocks {
            info!(
                block_id = %block.id,
                members = block.stats.member_count,
                median = %block.stats.weighted_median_rating,
                confidence = block.stats.confidence_score,
                "Block analyzed"
            );
        }

        let confidences: Vec<f64> = blocks.iter().map(|b| b.stats.confidence_score).collect();
        let summary = ReportSummary {
            raw_listings: raw_count,
            accepted,
            rejected: sanitized.rejections.len(),
            acceptance_rate,
            rating_changes: rebalanced.changes.len(),
            blocks_analyzed: blocks.len(),
            listings_in_blocks: blocks.iter().map(|b| b.stats.member_count).sum(),
            total_area: blocks.iter().map(|b| b.stats.total_area).sum(),
            average_confidence: mean(&confidences),
        };

        info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            blocks = summary.blocks_analyzed,
            "Area analysis complete"
        );

        AreaReport {
            area_name: area_name.to_string(),
            generated_at: Utc::now(),
            summary,
            blocks,
            overall_distribution,
            distribution_deviation: deviation,
            rejections: sanitized.rejections,
            rating_changes: rebalanced.changes,
        }
    }
}
