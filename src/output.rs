//! Report rendering through the log.
//!
//! Reports are emitted as log records; choosing a file format for them is
//! left to whoever consumes the library.

use anyhow::Result;
use tracing::{debug, info};

use crate::analyzers::types::AreaReport;

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &AreaReport) {
    debug!("{:#?}", report);
}

/// Logs the report as pretty-printed JSON.
pub fn print_json(report: &AreaReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Logs one line per block: id, size, median rating, and confidence.
pub fn print_blocks(report: &AreaReport) {
    for block in &report.blocks {
        info!(
            "{}: {} listings, median {} ({:?}), confidence {:.3}",
            block.id,
            block.stats.member_count,
            block.stats.weighted_median_rating,
            block.stats.rating_histogram,
            block.stats.confidence_score
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::listing::RawListing;
    use crate::pipeline::Pipeline;

    fn report() -> AreaReport {
        let listings = (0..12)
            .map(|i| RawListing {
                id: format!("o{i}"),
                address: "Kallidromiou 20".to_string(),
                price: Some(180_000.0),
                area: Some(70.0),
                rating: Some("D".to_string()),
                description: "Third floor flat".to_string(),
                flags: vec!["verified_source".to_string()],
                ..Default::default()
            })
            .collect();
        Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run("Exarchia", listings)
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&report());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&report()).unwrap();
    }

    #[test]
    fn test_print_blocks_does_not_panic() {
        print_blocks(&report());
    }

    #[test]
    fn test_report_json_uses_grade_labels() {
        let json = serde_json::to_value(report()).unwrap();
        let block = &json["blocks"][0];
        assert_eq!(block["id"], "Exarchia_CityBlock_01");
        assert_eq!(block["member_count"], 12);
        assert!(block.get("listings").is_none());
        assert!(json["overall_distribution"].get("D").is_some());
    }
}
