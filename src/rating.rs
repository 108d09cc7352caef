//! Energy-efficiency rating scale.
//!
//! Grades are ordered best to worst and each maps to an ordinal used for
//! arithmetic. "Plus" grades sit half a step above their base grade.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An energy-efficiency grade. The derived ordering runs best to worst, so
/// `Rating::APlus < Rating::F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    E,
    F,
}

/// Labels stripped from the front of free-text ratings, longest first.
static LOOSE_PREFIXES: &[&str] = &[
    "ενεργειακή κλάση",
    "ενεργειακη κλαση",
    "energy class",
    "energy rating",
    "κλάση",
    "κλαση",
    "class",
    "rating",
    "energy",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown energy rating: {0:?}")]
pub struct ParseRatingError(pub String);

impl Rating {
    /// Every grade on the scale, best first.
    pub const ALL: [Rating; 9] = [
        Rating::APlus,
        Rating::A,
        Rating::BPlus,
        Rating::B,
        Rating::CPlus,
        Rating::C,
        Rating::D,
        Rating::E,
        Rating::F,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Rating::APlus => "A+",
            Rating::A => "A",
            Rating::BPlus => "B+",
            Rating::B => "B",
            Rating::CPlus => "C+",
            Rating::C => "C",
            Rating::D => "D",
            Rating::E => "E",
            Rating::F => "F",
        }
    }

    /// The same grade as written on Greek certificates (Γ for C, Ζ for F).
    pub fn greek_label(self) -> &'static str {
        match self {
            Rating::APlus => "Α+",
            Rating::A => "Α",
            Rating::BPlus => "Β+",
            Rating::B => "Β",
            Rating::CPlus => "Γ+",
            Rating::C => "Γ",
            Rating::D => "Δ",
            Rating::E => "Ε",
            Rating::F => "Ζ",
        }
    }

    /// Ordinal in half steps, so plus grades stay exact.
    ///
    /// | Grade | Ordinal |
    /// |-------|---------|
    /// | A+    | 1       |
    /// | A     | 2       |
    /// | B+    | 2.5     |
    /// | B     | 3       |
    /// | C+    | 3.5     |
    /// | C     | 4       |
    /// | D     | 5       |
    /// | E     | 6       |
    /// | F     | 7       |
    pub(crate) fn half_steps(self) -> u32 {
        match self {
            Rating::APlus => 2,
            Rating::A => 4,
            Rating::BPlus => 5,
            Rating::B => 6,
            Rating::CPlus => 7,
            Rating::C => 8,
            Rating::D => 10,
            Rating::E => 12,
            Rating::F => 14,
        }
    }

    /// Numeric ordinal: 1 for A+ up to 7 for F.
    pub fn ordinal(self) -> f64 {
        self.half_steps() as f64 / 2.0
    }

    /// Exact inverse of [`Rating::ordinal`]. Returns `None` for values that
    /// are not a canonical ordinal.
    pub fn from_ordinal(value: f64) -> Option<Rating> {
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled.fract() != 0.0 || doubled < 0.0 {
            return None;
        }
        let steps = doubled as u32;
        Rating::ALL.iter().copied().find(|r| r.half_steps() == steps)
    }

    /// Rounds `value` to the grade with the nearest canonical ordinal,
    /// plus grades included, clamped to the A+..F range. A value exactly
    /// between two grades goes to the worse one. `None` for NaN.
    pub fn nearest(value: f64) -> Option<Rating> {
        if value.is_nan() {
            return None;
        }
        let clamped = value.clamp(1.0, 7.0);
        if let Some(exact) = Rating::from_ordinal(clamped) {
            return Some(exact);
        }
        Rating::ALL.iter().copied().min_by(|a, b| {
            let da = (a.ordinal() - clamped).abs();
            let db = (b.ordinal() - clamped).abs();
            da.total_cmp(&db).then(b.cmp(a))
        })
    }

    /// Lenient parse for scraped text such as `"Energy class: c"` or
    /// `"Ενεργειακή κλάση Γ"`. Greek certificate letters map onto A-F.
    pub fn parse_loose(text: &str) -> Option<Rating> {
        let lowered = text.trim().to_lowercase();
        let mut rest = lowered.as_str();

        loop {
            let before = rest;
            for prefix in LOOSE_PREFIXES {
                if let Some(stripped) = rest.strip_prefix(prefix) {
                    rest = stripped.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
                    break;
                }
            }
            if rest == before {
                break;
            }
        }

        let token = rest
            .split_whitespace()
            .next()?
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ')'));

        let latin: String = token
            .chars()
            .map(|c| match c {
                'α' => 'A',
                'β' => 'B',
                'γ' => 'C',
                'δ' => 'D',
                'ε' => 'E',
                'ζ' => 'F',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        latin.parse().ok()
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Rating {
    type Err = ParseRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Rating::ALL
            .iter()
            .copied()
            .find(|r| r.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseRatingError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_round_trip() {
        for rating in Rating::ALL {
            assert_eq!(Rating::from_ordinal(rating.ordinal()), Some(rating));
            assert_eq!(rating.label().parse::<Rating>(), Ok(rating));
        }
    }

    #[test]
    fn test_ordinal_values() {
        assert_eq!(Rating::APlus.ordinal(), 1.0);
        assert_eq!(Rating::BPlus.ordinal(), 2.5);
        assert_eq!(Rating::C.ordinal(), 4.0);
        assert_eq!(Rating::F.ordinal(), 7.0);
    }

    #[test]
    fn test_from_ordinal_rejects_non_canonical() {
        assert_eq!(Rating::from_ordinal(4.25), None);
        assert_eq!(Rating::from_ordinal(4.5), None);
        assert_eq!(Rating::from_ordinal(0.0), None);
        assert_eq!(Rating::from_ordinal(f64::NAN), None);
    }

    #[test]
    fn test_nearest_keeps_canonical_ordinals() {
        for rating in Rating::ALL {
            assert_eq!(Rating::nearest(rating.ordinal()), Some(rating));
        }
    }

    #[test]
    fn test_nearest_rounds_to_closest_grade() {
        assert_eq!(Rating::nearest(4.2), Some(Rating::C));
        assert_eq!(Rating::nearest(4.6), Some(Rating::D));
        assert_eq!(Rating::nearest(2.6), Some(Rating::BPlus));
        assert_eq!(Rating::nearest(3.4), Some(Rating::CPlus));
        assert_eq!(Rating::nearest(1.2), Some(Rating::APlus));
    }

    #[test]
    fn test_nearest_ties_go_to_worse_grade() {
        assert_eq!(Rating::nearest(4.5), Some(Rating::D));
        assert_eq!(Rating::nearest(2.25), Some(Rating::BPlus));
        assert_eq!(Rating::nearest(3.75), Some(Rating::C));
        assert_eq!(Rating::nearest(1.5), Some(Rating::A));
    }

    #[test]
    fn test_nearest_clamps() {
        assert_eq!(Rating::nearest(-3.0), Some(Rating::APlus));
        assert_eq!(Rating::nearest(12.0), Some(Rating::F));
        assert_eq!(Rating::nearest(f64::NEG_INFINITY), Some(Rating::APlus));
        assert_eq!(Rating::nearest(f64::NAN), None);
    }

    #[test]
    fn test_ordering_best_to_worst() {
        assert!(Rating::APlus < Rating::A);
        assert!(Rating::BPlus < Rating::B);
        assert!(Rating::E < Rating::F);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("a+".parse::<Rating>(), Ok(Rating::APlus));
        assert_eq!(" d ".parse::<Rating>(), Ok(Rating::D));
        assert!("G".parse::<Rating>().is_err());
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(Rating::parse_loose("Energy class: c"), Some(Rating::C));
        assert_eq!(Rating::parse_loose("Ενεργειακή κλάση Γ"), Some(Rating::C));
        assert_eq!(Rating::parse_loose("κλάση: Β+"), Some(Rating::BPlus));
        assert_eq!(Rating::parse_loose("A+"), Some(Rating::APlus));
        assert_eq!(Rating::parse_loose("D."), Some(Rating::D));
        assert_eq!(Rating::parse_loose("pending"), None);
        assert_eq!(Rating::parse_loose(""), None);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&Rating::APlus).unwrap();
        assert_eq!(json, "\"A+\"");
        let back: Rating = serde_json::from_str("\"C+\"").unwrap();
        assert_eq!(back, Rating::CPlus);
    }
}
