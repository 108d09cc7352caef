//! Accept/reject decision for a single listing, plus batch collection.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{PipelineConfig, RatioPolicy};
use crate::listing::Listing;
use crate::validators::confidence::{ConfidenceLevel, assess_confidence};
use crate::validators::field::{Check, validate_fields};

/// A listing that did not make it past sanitization, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub listing_id: String,
    pub reason: String,
}

/// A cleaned listing and what the sanitizer learned about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub listing: Listing,
    pub quality_score: u32,
    pub rating_confidence: ConfidenceLevel,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(Accepted),
    Rejected(Rejection),
}

/// Result of sanitizing a whole batch.
#[derive(Debug, Clone, Default)]
pub struct SanitizedBatch {
    pub accepted: Vec<Listing>,
    pub rejections: Vec<Rejection>,
}

impl SanitizedBatch {
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejections.len()
    }

    /// Share of listings accepted, 0.0 for an empty batch.
    pub fn acceptance_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.accepted.len() as f64 / self.total() as f64
        }
    }
}

/// Validates and cleans one listing.
///
/// Quality score: +2 valid price, +2 valid area, +2 valid price per m²,
/// +1 rating present, +1 description of at least the configured length.
/// A listing without a verified-source flag is always rejected.
pub fn sanitize(mut listing: Listing, config: &PipelineConfig) -> Outcome {
    let reject = |listing: &Listing, reason: String| {
        Outcome::Rejected(Rejection {
            listing_id: listing.id.clone(),
            reason,
        })
    };

    let mut fields = validate_fields(listing.price, listing.area, &config.validation);
    let mut warnings = Vec::new();

    if let Some(reason) = fields.rejection() {
        let ratio_only = fields.price.passed() && fields.area.passed();
        if ratio_only && config.validation.ratio_policy == RatioPolicy::ClearArea {
            warnings.push(format!("area cleared: {reason}"));
            listing.area = None;
            listing.push_flag("area_cleared_ratio");
            fields.area = Check::Absent;
            fields.ratio = Check::Absent;
        } else {
            return reject(&listing, reason.to_string());
        }
    }

    let mut quality_score = 0;
    if fields.price.passed() {
        quality_score += 2;
    }
    if fields.area.passed() {
        quality_score += 2;
    } else {
        warnings.push("no area data".to_string());
    }
    if fields.ratio.passed() {
        quality_score += 2;
    }
    if listing.rating.is_some() {
        quality_score += 1;
    }
    if listing.description.trim().chars().count() >= config.sanitizer.min_description_len {
        quality_score += 1;
    } else {
        warnings.push("minimal description".to_string());
    }

    let verified = listing.flags.iter().any(|flag| {
        config
            .sanitizer
            .verified_source_markers
            .iter()
            .any(|marker| flag.contains(marker.as_str()))
    });
    if !verified {
        return reject(&listing, "not from a verified source".to_string());
    }

    if quality_score < config.sanitizer.min_quality_score {
        return reject(
            &listing,
            format!("insufficient data quality score: {quality_score}"),
        );
    }

    let rating_confidence = assess_confidence(
        listing.rating,
        &listing.description,
        listing.price,
        listing.area,
        &config.confidence,
    );
    match rating_confidence {
        ConfidenceLevel::None => {}
        ConfidenceLevel::Fake => {
            listing.rating = None;
            listing.push_flag("rating_removed_fake");
        }
        level => listing.push_flag(format!("rating_confidence_{}", level.label())),
    }

    listing.confidence_score = config.sanitizer.sanitized_confidence;
    listing.push_flag("sanitized");
    listing.push_flag(format!("quality_score_{quality_score}"));

    Outcome::Accepted(Accepted {
        listing,
        quality_score,
        rating_confidence,
        warnings,
    })
}

/// Sanitizes every listing independently; one bad record never affects
/// the rest of the batch.
#[tracing::instrument(skip_all, fields(listings = tracing::field::Empty))]
pub fn sanitize_batch(
    listings: impl IntoIterator<Item = Listing>,
    config: &PipelineConfig,
) -> SanitizedBatch {
    let mut batch = SanitizedBatch::default();

    for listing in listings {
        match sanitize(listing, config) {
            Outcome::Accepted(accepted) => {
                if !accepted.warnings.is_empty() {
                    debug!(
                        listing_id = %accepted.listing.id,
                        warnings = ?accepted.warnings,
                        "Listing accepted with warnings"
                    );
                }
                batch.accepted.push(accepted.listing);
            }
            Outcome::Rejected(rejection) => {
                debug!(
                    listing_id = %rejection.listing_id,
                    reason = %rejection.reason,
                    "Listing rejected"
                );
                batch.rejections.push(rejection);
            }
        }
    }

    tracing::Span::current().record("listings", batch.total());
    info!(
        accepted = batch.accepted.len(),
        rejected = batch.rejections.len(),
        acceptance_rate = batch.acceptance_rate(),
        "Sanitization complete"
    );

    batch
}
