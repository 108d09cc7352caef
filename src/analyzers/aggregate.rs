use std::collections::BTreeMap;

use crate::analyzers::median::weighted_median;
use crate::analyzers::types::{Block, BlockStats, Completeness, DistributionDeviation, GradeShare, RangeStats};
use crate::analyzers::utility::{histogram, max, mean, min, ratio, round_to};
use crate::config::ReferenceDistribution;
use crate::listing::Listing;
use crate::rating::Rating;

/// Confidence bonuses for rating diversity within a block.
static DIVERSITY_BONUS: &[(usize, f64)] = &[(3, 0.2), (2, 0.1)];

/// Upper limit on the confidence bonus earned by sample size.
const MAX_SIZE_BONUS: f64 = 0.1;

/// Builds a [`Block`] from its members and computes its statistics.
///
/// Confidence is the mean field completeness plus a bonus for rating
/// diversity (0.1 for two grades, 0.2 for three or more) and one for sample
/// size (members / 100, at most 0.1), capped at 1.0.
pub fn aggregate_block(id: String, listings: Vec<Listing>, default_rating: Rating) -> Block {
    let member_count = listings.len();

    let prices: Vec<f64> = listings.iter().filter_map(|l| l.price).filter(|p| *p > 0.0).collect();
    let areas: Vec<f64> = listings.iter().filter_map(|l| l.area).filter(|a| *a > 0.0).collect();
    let price_per_area: Vec<f64> = listings.iter().filter_map(Listing::price_per_area).collect();

    let rating_histogram = histogram(&listings);

    let completeness = Completeness {
        price: ratio(prices.len(), member_count),
        area: ratio(areas.len(), member_count),
        rating: ratio(listings.iter().filter(|l| l.rating.is_some()).count(), member_count),
        floor: ratio(listings.iter().filter(|l| l.floor.is_some()).count(), member_count),
        rooms: ratio(
            listings.iter().filter(|l| l.rooms.is_some_and(|r| r > 0)).count(),
            member_count,
        ),
    };

    let confidence_score = if member_count == 0 {
        0.0
    } else {
        let diversity = DIVERSITY_BONUS
            .iter()
            .find(|(grades, _)| rating_histogram.len() >= *grades)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0.0);
        let size = (member_count as f64 / 100.0).min(MAX_SIZE_BONUS);
        round_to((completeness.mean() + diversity + size).min(1.0), 3)
    };

    let stats = BlockStats {
        member_count,
        total_area: areas.iter().sum(),
        weighted_median_rating: weighted_median(&listings, default_rating),
        rating_histogram,
        price: range(&prices),
        area: range(&areas),
        avg_price_per_area: mean(&price_per_area),
        completeness,
        confidence_score,
    };

    Block { id, listings, stats }
}

/// Compares the rating mix of `listings` with the reference distribution.
pub fn distribution_deviation(
    listings: &[Listing],
    reference: &ReferenceDistribution,
) -> DistributionDeviation {
    let counts = histogram(listings);
    let rated: usize = counts.values().sum();

    let mut grades: BTreeMap<Rating, GradeShare> = reference
        .iter()
        .map(|(rating, expected)| {
            (
                rating,
                GradeShare {
                    rating,
                    observed: 0.0,
                    expected,
                },
            )
        })
        .collect();
    for (rating, count) in &counts {
        grades
            .entry(*rating)
            .or_insert(GradeShare {
                rating: *rating,
                observed: 0.0,
                expected: 0.0,
            })
            .observed = ratio(*count, rated);
    }

    let total_variation = grades
        .values()
        .map(|g| (g.observed - g.expected).abs())
        .sum::<f64>()
        / 2.0;

    DistributionDeviation {
        grades: grades.into_values().collect(),
        total_variation,
    }
}

fn range(values: &[f64]) -> RangeStats {
    RangeStats {
        min: min(values),
        max: max(values),
        avg: mean(values),
    }
}
