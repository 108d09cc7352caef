//! Slicing the listing pool into city blocks.

use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use tracing::{info, warn};

use crate::listing::Listing;

/// Stand-ins used by the sort key when a listing lacks a value.
const DEFAULT_PRICE: f64 = 50_000.0;
const DEFAULT_AREA: f64 = 50.0;
const LOCATION_BUCKETS: u64 = 1_000;

/// Groups `listings` into at most `target_blocks` blocks of equal size.
///
/// Listings are sorted by [`sort_key`] so that neighbours by address and
/// price land together, then sliced into runs of
/// `max(min_block_size, len / target_blocks)`. Any run shorter than
/// `min_block_size` (the final remainder) is dropped.
#[tracing::instrument(skip(listings), fields(listings = listings.len()))]
pub fn partition(listings: Vec<Listing>, target_blocks: usize, min_block_size: usize) -> Vec<Vec<Listing>> {
    if listings.is_empty() || target_blocks == 0 {
        return Vec::new();
    }

    let block_size = (listings.len() / target_blocks).max(min_block_size).max(1);

    let mut keyed: Vec<((u64, f64), Listing)> = listings.into_iter().map(|l| (sort_key(&l), l)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b));

    let mut blocks = Vec::new();
    let mut dropped = 0;
    let mut sorted = keyed.into_iter().map(|(_, l)| l).peekable();
    while sorted.peek().is_some() {
        let chunk: Vec<Listing> = sorted.by_ref().take(block_size).collect();
        if chunk.len() >= min_block_size {
            blocks.push(chunk);
        } else {
            dropped += chunk.len();
        }
    }

    if blocks.len() > target_blocks {
        dropped += blocks[target_blocks..].iter().map(Vec::len).sum::<usize>();
        blocks.truncate(target_blocks);
    }

    if blocks.is_empty() {
        warn!(min_block_size, dropped, "No block reached the minimum size");
    } else {
        info!(blocks = blocks.len(), block_size, dropped, "Listings partitioned into blocks");
    }

    blocks
}

/// Deterministic composite key: an address bucket from a stable hash, then
/// `price / 1000 + area`.
pub fn sort_key(listing: &Listing) -> (u64, f64) {
    let location = if listing.address.is_empty() {
        0
    } else {
        let digest = Sha256::digest(listing.address.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head) % LOCATION_BUCKETS
    };

    let price = listing.price.unwrap_or(DEFAULT_PRICE);
    let area = listing.area.unwrap_or(DEFAULT_AREA);
    (location, price / 1000.0 + area)
}

fn compare_keys(a: &(u64, f64), b: &(u64, f64)) -> Ordering {
    a.0.cmp(&b.0).then(a.1.total_cmp(&b.1))
}
