//! Area-weighted median rating.
//!
//! Each listing with a rating and a positive area contributes its rating
//! ordinal `floor(area)` times. The median of that multiset is the rating
//! a "typical square metre" of the block carries.

use tracing::debug;

use crate::listing::Listing;
use crate::rating::Rating;

/// Numeric weighted median of the rating ordinals, or `None` when no
/// listing has both a rating and at least one whole m² of area.
///
/// Walks cumulative weights instead of materialising the repeated values;
/// the result is identical to sorting the expanded multiset. Weights are
/// summed as `u128`, so no set of areas can overflow the total.
pub fn weighted_median_value(listings: &[Listing]) -> Option<f64> {
    let mut weighted: Vec<(u32, u64)> = listings
        .iter()
        .filter_map(|l| match (l.rating, l.area) {
            (Some(rating), Some(area)) if area > 0.0 => Some((rating.half_steps(), area.floor() as u64)),
            _ => None,
        })
        .filter(|(_, weight)| *weight > 0)
        .collect();

    let total: u128 = weighted.iter().map(|(_, w)| u128::from(*w)).sum();
    if total == 0 {
        return None;
    }

    weighted.sort_by_key(|(steps, _)| *steps);

    // value at 0-based position `k` of the expanded, sorted multiset
    let nth = |k: u128| -> u32 {
        let mut seen: u128 = 0;
        for (steps, weight) in &weighted {
            seen += u128::from(*weight);
            if k < seen {
                return *steps;
            }
        }
        weighted.last().map(|(s, _)| *s).unwrap_or(0)
    };

    let median_steps = if total % 2 == 1 {
        nth(total / 2) as f64
    } else {
        (nth(total / 2 - 1) as f64 + nth(total / 2) as f64) / 2.0
    };

    Some(median_steps / 2.0)
}

/// Area-weighted median rating of `listings`, rounded to the nearest
/// canonical grade, plus grades included (exact ties go to the worse
/// grade). Falls back to `default` when nothing qualifies.
pub fn weighted_median(listings: &[Listing], default: Rating) -> Rating {
    match weighted_median_value(listings).and_then(|value| Rating::nearest(value).map(|r| (value, r))) {
        Some((value, rating)) => {
            debug!(median = value, rating = %rating, "Weighted median computed");
            rating
        }
        None => {
            debug!(default = %default, "No rated listings with area, using default rating");
            default
        }
    }
}
