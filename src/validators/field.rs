use crate::config::ValidationConfig;

/// Outcome of a single field check.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Passed,
    /// The value was not supplied; not a failure on its own.
    Absent,
    Failed(String),
}

impl Check {
    pub fn passed(&self) -> bool {
        matches!(self, Check::Passed)
    }

    fn reason(&self) -> Option<&str> {
        match self {
            Check::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Result of checking price, area, and price per m² for one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReport {
    pub price: Check,
    pub area: Check,
    pub ratio: Check,
}

impl FieldReport {
    pub fn is_valid(&self) -> bool {
        self.rejection().is_none()
    }

    /// First failure in check order (price, area, ratio).
    pub fn rejection(&self) -> Option<&str> {
        self.price
            .reason()
            .or_else(|| self.area.reason())
            .or_else(|| self.ratio.reason())
    }
}

/// Checks price and area against the configured bounds. All bounds are
/// inclusive. The ratio is only checked when both values passed.
///
/// A non-positive area counts as absent; a non-positive price counts as
/// missing, which fails.
pub fn validate_fields(price: Option<f64>, area: Option<f64>, config: &ValidationConfig) -> FieldReport {
    let price_check = match price {
        Some(p) if p > 0.0 => {
            if p < config.min_price || p > config.max_price {
                Check::Failed(format!(
                    "price out of range: €{p:.0} (allowed {:.0}-{:.0})",
                    config.min_price, config.max_price
                ))
            } else {
                Check::Passed
            }
        }
        _ => Check::Failed("missing price".to_string()),
    };

    let area_check = match area {
        Some(a) if a > 0.0 => {
            if a < config.min_area || a > config.max_area {
                Check::Failed(format!(
                    "area out of range: {a:.0}m² (allowed {:.0}-{:.0})",
                    config.min_area, config.max_area
                ))
            } else {
                Check::Passed
            }
        }
        _ => Check::Absent,
    };

    let ratio_check = match (price, area) {
        (Some(p), Some(a)) if price_check.passed() && area_check.passed() => {
            let ratio = p / a;
            if ratio < config.min_ratio {
                Check::Failed(format!(
                    "price per m² too low: €{ratio:.0}/m² < minimum €{:.0}/m²",
                    config.min_ratio
                ))
            } else if ratio > config.max_ratio {
                Check::Failed(format!(
                    "price per m² too high: €{ratio:.0}/m² > maximum €{:.0}/m²",
                    config.max_ratio
                ))
            } else {
                Check::Passed
            }
        }
        _ => Check::Absent,
    };

    FieldReport {
        price: price_check,
        area: area_check,
        ratio: ratio_check,
    }
}
