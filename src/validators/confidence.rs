//! Heuristic trust score for a listing's energy rating.
//!
//! Listing sites often fill in a rating the seller never supplied. The
//! score rewards textual corroboration and ratings that fit the price, and
//! penalises the grade sites most often emit as a silent default. It is an
//! approximation, not a verified classifier.

use serde::Serialize;

use crate::config::ConfidenceConfig;
use crate::rating::Rating;

/// How far a rating can be trusted. `None` means there was no rating to
/// assess; the remaining levels are ordered from least to most trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    None,
    Fake,
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::None => "none",
            ConfidenceLevel::Fake => "fake",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }
}

/// Raw corroboration score for `rating`, or `None` when there is no rating.
///
/// | Signal                                                    | Points |
/// |-----------------------------------------------------------|--------|
/// | grade label appears as a word in the description          | +3     |
/// | description mentions any rating keyword                   | +1     |
/// | grade is one of the worse (common, believable) grades     | +1     |
/// | best grade and price per m² above the premium threshold   | +1     |
/// | suspect default grade, long description, no label, no renovation keyword | −1 |
///
/// The label only counts as a standalone word, in Latin or Greek letters:
/// "C" matches "class C" but not "cozy", and "A" does not match "A+". Alphanumerics
/// and `+` are word characters; anything else bounds the label.
pub fn confidence_score(
    rating: Option<Rating>,
    description: &str,
    price: Option<f64>,
    area: Option<f64>,
    config: &ConfidenceConfig,
) -> Option<i32> {
    let rating = rating?;
    let text = description.to_lowercase();
    let mut score = 0;

    let label_found = mentions_grade(&text, rating);
    if label_found {
        score += config.exact_label_points;
    }

    if contains_any(&text, &config.rating_keywords) {
        score += config.keyword_points;
    }

    if config.worse_grades.contains(&rating) {
        score += config.worse_grade_points;
    } else if config.best_grades.contains(&rating) {
        let premium = match (price, area) {
            (Some(p), Some(a)) if a > 0.0 => p / a > config.premium_ratio,
            _ => false,
        };
        if premium {
            score += config.premium_points;
        }
    }

    if rating == config.suspect_default
        && description.chars().count() > config.penalty_min_description
        && !label_found
        && !contains_any(&text, &config.renovation_keywords)
    {
        score -= config.default_penalty;
    }

    Some(score)
}

/// Maps the corroboration score onto a [`ConfidenceLevel`].
pub fn assess_confidence(
    rating: Option<Rating>,
    description: &str,
    price: Option<f64>,
    area: Option<f64>,
    config: &ConfidenceConfig,
) -> ConfidenceLevel {
    match confidence_score(rating, description, price, area, config) {
        None => ConfidenceLevel::None,
        Some(s) if s >= config.high_threshold => ConfidenceLevel::High,
        Some(s) if s >= config.medium_threshold => ConfidenceLevel::Medium,
        Some(s) if s >= 0 => ConfidenceLevel::Low,
        Some(_) => ConfidenceLevel::Fake,
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(&k.to_lowercase()))
}

/// Whether the grade appears as a standalone word, in Latin or Greek letters.
/// A single-letter grade must not match inside ordinary words, and "a" must
/// not match "a+".
fn mentions_grade(text: &str, rating: Rating) -> bool {
    [rating.label(), rating.greek_label()]
        .iter()
        .any(|label| mentions_word(text, &label.to_lowercase()))
}

fn mentions_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(start, m)| {
        let before = text[..start].chars().next_back();
        let after = text[start + m.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '+'
}
