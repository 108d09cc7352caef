//! Listing records as they enter and move through the pipeline.

use serde::{Deserialize, Serialize};

use crate::rating::Rating;

/// A scraped listing, already flattened into fields but not yet checked.
///
/// `rating` is the raw text the scraper found; it is matched against the
/// rating scale when the record becomes a [`Listing`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawListing {
    pub id: String,
    pub url: String,
    pub title: String,
    pub address: String,
    pub price: Option<f64>,
    pub area: Option<f64>,
    pub rating: Option<String>,
    pub floor: Option<i32>,
    pub rooms: Option<u32>,
    pub description: String,
    pub flags: Vec<String>,
}

/// A listing with a typed rating, quality flags, and a confidence score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub url: String,
    pub title: String,
    pub address: String,
    pub price: Option<f64>,
    /// Floor area in m².
    pub area: Option<f64>,
    pub rating: Option<Rating>,
    pub floor: Option<i32>,
    pub rooms: Option<u32>,
    pub description: String,
    pub flags: Vec<String>,
    pub confidence_score: f64,
}

impl Listing {
    /// Price per m², when both values are present and the area is positive.
    pub fn price_per_area(&self) -> Option<f64> {
        match (self.price, self.area) {
            (Some(price), Some(area)) if area > 0.0 => Some(price / area),
            _ => None,
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub(crate) fn push_flag(&mut self, flag: impl Into<String>) {
        self.flags.push(flag.into());
    }
}

impl From<RawListing> for Listing {
    fn from(raw: RawListing) -> Self {
        let mut flags = raw.flags;

        let rating = match raw.rating.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                let parsed = Rating::parse_loose(text);
                if parsed.is_none() {
                    flags.push("rating_unparsed".to_string());
                }
                parsed
            }
        };

        Listing {
            id: raw.id,
            url: raw.url,
            title: raw.title,
            address: raw.address,
            price: raw.price,
            area: raw.area,
            rating,
            floor: raw.floor,
            rooms: raw.rooms,
            description: raw.description,
            flags,
            confidence_score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rating: Option<&str>) -> RawListing {
        RawListing {
            id: "l1".to_string(),
            price: Some(250_000.0),
            area: Some(100.0),
            rating: rating.map(str::to_string),
            flags: vec!["verified_source".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_from_raw_parses_rating() {
        let listing = Listing::from(raw(Some("Energy class: B")));
        assert_eq!(listing.rating, Some(Rating::B));
        assert!(!listing.has_flag("rating_unparsed"));
    }

    #[test]
    fn test_from_raw_flags_unparseable_rating() {
        let listing = Listing::from(raw(Some("under review")));
        assert_eq!(listing.rating, None);
        assert!(listing.has_flag("rating_unparsed"));
        assert!(listing.has_flag("verified_source"));
    }

    #[test]
    fn test_from_raw_blank_rating_is_absent() {
        let listing = Listing::from(raw(Some("   ")));
        assert_eq!(listing.rating, None);
        assert!(!listing.has_flag("rating_unparsed"));
    }

    #[test]
    fn test_price_per_area() {
        let listing = Listing::from(raw(None));
        assert_eq!(listing.price_per_area(), Some(2500.0));

        let no_area = Listing {
            area: Some(0.0),
            ..listing.clone()
        };
        assert_eq!(no_area.price_per_area(), None);
    }
}
