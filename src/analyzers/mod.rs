//! Batch-level correction and neighbourhood aggregation.
//!
//! This module takes the sanitized listing pool, corrects skew in its
//! rating distribution, slices it into city blocks, and computes the
//! area-weighted median rating and summary statistics for each block.

pub mod aggregate;
pub mod median;
pub mod partition;
pub mod rebalance;
pub mod types;
pub mod utility;
