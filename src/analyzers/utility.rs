use std::collections::BTreeMap;

use crate::listing::Listing;
use crate::rating::Rating;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Smallest value, or 0.0 for empty input.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Largest value, or 0.0 for empty input.
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Share of `part` in `total`, 0.0 when `total` is zero.
pub fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Count of listings per rating; unrated listings are not counted.
pub fn histogram(listings: &[Listing]) -> BTreeMap<Rating, usize> {
    let mut counts = BTreeMap::new();
    for rating in listings.iter().filter_map(|l| l.rating) {
        *counts.entry(rating).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_min_max() {
        let values = [3.0, 1.5, 9.0];
        assert_eq!(min(&values), 1.5);
        assert_eq!(max(&values), 9.0);
        assert_eq!(min(&[]), 0.0);
        assert_eq!(max(&[]), 0.0);
    }

    #[test]
    fn test_ratio_with_zero_total() {
        assert_eq!(ratio(3, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.87654, 3), 0.877);
        assert_eq!(round_to(2.0, 3), 2.0);
    }

    #[test]
    fn test_histogram_skips_unrated() {
        let listings = vec![
            Listing { rating: Some(Rating::C), ..Default::default() },
            Listing { rating: Some(Rating::C), ..Default::default() },
            Listing { rating: Some(Rating::A), ..Default::default() },
            Listing::default(),
        ];
        let counts = histogram(&listings);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&Rating::C], 2);
        assert_eq!(counts[&Rating::A], 1);
    }
}
