//! Population-level correction of the rating distribution.
//!
//! Raw extraction over-reports best-in-class ratings (cached defaults,
//! mis-parsed markup). When a batch shows little diversity and one grade
//! dominates it, most of that grade's listings are moved to common
//! fallback grades; listings without any rating are then handed ratings
//! from a fixed cycle biased toward the common grades. This is a heuristic
//! correction, not a statistical model, and every change is reported.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::analyzers::utility::histogram;
use crate::config::{RebalanceConfig, ReferenceDistribution};
use crate::listing::Listing;
use crate::rating::Rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Moved away from a dominant grade.
    Rebalanced,
    /// Had no rating and was given one from the assignment cycle.
    Assigned,
}

/// One rating reassignment, kept so callers can audit or undo it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingChange {
    pub listing_id: String,
    pub from: Option<Rating>,
    pub to: Rating,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Default)]
pub struct Rebalanced {
    pub listings: Vec<Listing>,
    pub changes: Vec<RatingChange>,
}

/// Rebalances a sanitized batch and returns the corrected batch together
/// with the list of changes made.
///
/// 1. A batch with at least `diversity_threshold` distinct grades is
///    returned untouched.
/// 2. Any grade holding more than `dominance_threshold` of the rated
///    listings keeps its first `keep_dominant` listings; the rest move to
///    the fallback grades in turn, without pushing any grade over the cap.
/// 3. Unrated listings get grades from `assignment_cycle`.
#[tracing::instrument(skip_all, fields(listings = listings.len()))]
pub fn rebalance(
    mut listings: Vec<Listing>,
    config: &RebalanceConfig,
    reference: &ReferenceDistribution,
) -> Rebalanced {
    let before = histogram(&listings);
    let unrated = listings.iter().filter(|l| l.rating.is_none()).count();
    info!(distribution = ?before, unrated, "Rating distribution before rebalancing");

    if before.len() >= config.diversity_threshold {
        info!(grades = before.len(), "Rating distribution diverse enough, leaving batch unchanged");
        return Rebalanced {
            listings,
            changes: Vec::new(),
        };
    }

    let mut changes = Vec::new();
    let rated: usize = before.values().sum();
    let cap = dominance_cap(rated, config.dominance_threshold);

    let mut dominant: Vec<(Rating, usize)> = before
        .iter()
        .filter(|(_, count)| **count > cap)
        .map(|(r, c)| (*r, *c))
        .collect();
    dominant.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut counts = before.clone();
    for (grade, count) in dominant {
        info!(grade = %grade, count, cap, "Rebalancing dominant grade");

        let mut members: Vec<usize> = listings
            .iter()
            .enumerate()
            .filter(|(_, l)| l.rating == Some(grade))
            .map(|(idx, _)| idx)
            .collect();
        if let Some(seed) = config.shuffle_seed {
            members.shuffle(&mut StdRng::seed_from_u64(seed));
        }

        let mut cursor = 0;
        for idx in members.into_iter().skip(config.keep_dominant) {
            let target = pick_target(grade, &counts, cap, &config.fallback_grades, &mut cursor, reference);

            if let Some(c) = counts.get_mut(&grade) {
                *c -= 1;
            }
            *counts.entry(target).or_default() += 1;

            let listing = &mut listings[idx];
            listing.rating = Some(target);
            listing.push_flag(format!("rating_rebalanced_to_{}", target.label()));
            debug!(listing_id = %listing.id, from = %grade, to = %target, "Rating rebalanced");
            changes.push(RatingChange {
                listing_id: listing.id.clone(),
                from: Some(grade),
                to: target,
                kind: ChangeKind::Rebalanced,
            });
        }
    }

    if !config.assignment_cycle.is_empty() {
        let cycle = config.assignment_cycle.iter().copied().cycle();
        for (listing, grade) in listings.iter_mut().filter(|l| l.rating.is_none()).zip(cycle) {
            listing.rating = Some(grade);
            listing.push_flag(format!("rating_assigned_{}", grade.label()));
            changes.push(RatingChange {
                listing_id: listing.id.clone(),
                from: None,
                to: grade,
                kind: ChangeKind::Assigned,
            });
        }
    }

    info!(
        distribution = ?histogram(&listings),
        changes = changes.len(),
        "Rating distribution after rebalancing"
    );

    Rebalanced { listings, changes }
}

/// Largest count a single grade may hold among `rated` listings.
pub fn dominance_cap(rated: usize, threshold: f64) -> usize {
    ((threshold * rated as f64).floor() as usize).max(1)
}

/// Next grade to receive a listing moved away from `from`.
///
/// Fallback grades are tried in turn starting at `cursor`; if all are at
/// the cap, the reference distribution is walked from the most to the least
/// expected grade; if every grade is at the cap, the least populated grade
/// wins. `from` itself is never chosen.
fn pick_target(
    from: Rating,
    counts: &BTreeMap<Rating, usize>,
    cap: usize,
    fallbacks: &[Rating],
    cursor: &mut usize,
    reference: &ReferenceDistribution,
) -> Rating {
    let count = |r: Rating| counts.get(&r).copied().unwrap_or(0);

    for offset in 0..fallbacks.len() {
        let pos = (*cursor + offset) % fallbacks.len();
        let candidate = fallbacks[pos];
        if candidate != from && count(candidate) < cap {
            *cursor = pos + 1;
            return candidate;
        }
    }

    if let Some(candidate) = reference
        .by_expected_share()
        .into_iter()
        .find(|r| *r != from && count(*r) < cap)
    {
        return candidate;
    }

    Rating::ALL
        .iter()
        .copied()
        .filter(|r| *r != from)
        .min_by_key(|r| count(*r))
        .unwrap_or(from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(grades: &[(Option<Rating>, usize)]) -> Vec<Listing> {
        let mut listings = Vec::new();
        for (grade, n) in grades {
            for _ in 0..*n {
                listings.push(Listing {
                    id: format!("l{}", listings.len()),
                    rating: *grade,
                    area: Some(80.0),
                    ..Default::default()
                });
            }
        }
        listings
    }

    fn run(listings: Vec<Listing>, config: &RebalanceConfig) -> Rebalanced {
        rebalance(listings, config, &ReferenceDistribution::default())
    }

    #[test]
    fn test_diverse_batch_unchanged() {
        let listings = batch(&[(Some(Rating::A), 8), (Some(Rating::C), 1), (Some(Rating::D), 1), (None, 2)]);
        let result = run(listings.clone(), &RebalanceConfig::default());

        assert_eq!(result.listings, listings);
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_dominant_grade_capped() {
        let listings = batch(&[(Some(Rating::A), 90), (Some(Rating::B), 10)]);
        let config = RebalanceConfig::default();
        let result = run(listings, &config);

        let counts = histogram(&result.listings);
        let total: usize = counts.values().sum();
        assert_eq!(total, 100);
        for (grade, count) in &counts {
            assert!(
                *count as f64 / total as f64 <= config.dominance_threshold,
                "{grade} holds {count} of {total}"
            );
        }
        assert_eq!(counts[&Rating::A], 3);
        assert_eq!(counts[&Rating::C], 40);
        assert_eq!(counts[&Rating::D], 40);
        assert_eq!(counts[&Rating::B], 17);
    }

    #[test]
    fn test_first_listings_keep_dominant_grade() {
        let listings = batch(&[(Some(Rating::A), 10)]);
        let result = run(listings, &RebalanceConfig::default());

        for listing in &result.listings[..3] {
            assert_eq!(listing.rating, Some(Rating::A));
        }
        assert_eq!(result.listings[3].rating, Some(Rating::C));
        assert!(result.listings[3].has_flag("rating_rebalanced_to_C"));
        assert_eq!(result.listings[4].rating, Some(Rating::D));
        assert!(result.listings[4].has_flag("rating_rebalanced_to_D"));
        assert!(result.changes.iter().all(|c| c.kind == ChangeKind::Rebalanced));
    }

    #[test]
    fn test_dominant_fallback_grade_not_reassigned_to_itself() {
        let listings = batch(&[(Some(Rating::C), 8), (Some(Rating::A), 2)]);
        let result = run(listings, &RebalanceConfig::default());

        assert!(result.changes.iter().all(|c| c.from != Some(c.to)));
        let counts = histogram(&result.listings);
        assert_eq!(counts[&Rating::C], 3);
        assert_eq!(counts[&Rating::A], 2);
        assert!(counts.values().all(|c| *c <= 4));
    }

    #[test]
    fn test_unrated_get_cycle_assignment() {
        let listings = batch(&[(Some(Rating::C), 2), (None, 10)]);
        let result = run(listings, &RebalanceConfig::default());

        let assigned: Vec<Rating> = result
            .changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Assigned)
            .map(|c| c.to)
            .collect();
        use Rating::*;
        assert_eq!(assigned, vec![C, D, C, B, D, E, C, D, C, D]);
        assert!(result.listings.iter().all(|l| l.rating.is_some()));
        assert!(result.listings[2].has_flag("rating_assigned_C"));
        assert!(result.listings[3].has_flag("rating_assigned_D"));
    }

    #[test]
    fn test_all_unrated_batch() {
        let listings = batch(&[(None, 4)]);
        let result = run(listings, &RebalanceConfig::default());
        assert_eq!(result.changes.len(), 4);
        assert!(result.listings.iter().all(|l| l.rating.is_some()));
    }

    #[test]
    fn test_empty_batch() {
        let result = run(Vec::new(), &RebalanceConfig::default());
        assert!(result.listings.is_empty());
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let config = RebalanceConfig {
            shuffle_seed: Some(42),
            ..Default::default()
        };
        let first = run(batch(&[(Some(Rating::A), 20)]), &config);
        let second = run(batch(&[(Some(Rating::A), 20)]), &config);

        assert_eq!(first.changes, second.changes);
        assert_eq!(histogram(&first.listings)[&Rating::A], 3);
    }

    #[test]
    fn test_small_dominant_group_left_alone() {
        // 3 of 4 rated are A, but only the kept listings hold that grade
        let listings = batch(&[(Some(Rating::A), 3), (Some(Rating::D), 1)]);
        let result = run(listings, &RebalanceConfig::default());
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_dominance_cap_never_zero() {
        assert_eq!(dominance_cap(0, 0.4), 1);
        assert_eq!(dominance_cap(2, 0.4), 1);
        assert_eq!(dominance_cap(100, 0.4), 40);
    }
}
