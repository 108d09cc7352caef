//! Per-listing plausibility checks and sanitization.
//!
//! [`field`] bounds price, area, and price per m². [`confidence`] scores how
//! believable a listing's energy rating is. [`sanitizer`] combines both into
//! an accept/reject decision with quality flags.

pub mod confidence;
pub mod field;
pub mod sanitizer;
