//! Loading raw listing records from CSV or JSON dumps.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::listing::RawListing;

/// One CSV row. Flags are a single `;`-separated column.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    id: String,
    url: String,
    title: String,
    address: String,
    price: Option<f64>,
    area: Option<f64>,
    rating: Option<String>,
    floor: Option<i32>,
    rooms: Option<u32>,
    description: String,
    flags: String,
}

impl From<CsvRow> for RawListing {
    fn from(row: CsvRow) -> Self {
        RawListing {
            id: row.id,
            url: row.url,
            title: row.title,
            address: row.address,
            price: row.price,
            area: row.area,
            rating: row.rating,
            floor: row.floor,
            rooms: row.rooms,
            description: row.description,
            flags: row
                .flags
                .split(';')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Reads listings from CSV with a header row.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawListing>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut listings = Vec::new();

    for result in rdr.deserialize() {
        let row: CsvRow = result?;
        listings.push(row.into());
    }

    Ok(listings)
}

/// Reads listings from a JSON array of records.
pub fn parse_json(content: &str) -> Result<Vec<RawListing>> {
    Ok(serde_json::from_str(content)?)
}

/// Loads listings from `path`, choosing the format by file extension.
pub fn load_listings(path: impl AsRef<Path>) -> Result<Vec<RawListing>> {
    let path = path.as_ref();
    let listings = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            parse_csv(file).with_context(|| format!("parsing CSV {}", path.display()))?
        }
        Some("json") => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_json(&content).with_context(|| format!("parsing JSON {}", path.display()))?
        }
        _ => bail!("unsupported listing file: {}", path.display()),
    };

    debug!(path = %path.display(), count = listings.len(), "Listings loaded");
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    const CSV: &str = "\
id,url,title,address,price,area,rating,floor,rooms,description,flags
k1,https://example.gr/1,Flat,Skoufa 12,320000,95,C,3,2,Energy class C,verified_source;xe_gr
k2,https://example.gr/2,Studio,Tsakalof 4,,40,,,1,Small studio,verified_source
";

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_parse_csv_rows() {
        let listings = parse_csv(CSV.as_bytes()).unwrap();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.id, "k1");
        assert_eq!(first.price, Some(320_000.0));
        assert_eq!(first.rating.as_deref(), Some("C"));
        assert_eq!(first.floor, Some(3));
        assert_eq!(first.flags, vec!["verified_source", "xe_gr"]);

        let second = &listings[1];
        assert_eq!(second.price, None);
        assert_eq!(second.rating, None);
        assert_eq!(second.floor, None);
        assert_eq!(second.flags, vec!["verified_source"]);
    }

    #[test]
    fn test_parse_csv_bad_number_fails() {
        let bad = "id,price\nx,not-a-number\n";
        assert!(parse_csv(bad.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_json_with_missing_fields() {
        let json = r#"[{"id": "j1", "price": 210000, "flags": ["verified_source"]}]"#;
        let listings = parse_json(json).unwrap();
        assert_eq!(listings[0].id, "j1");
        assert_eq!(listings[0].area, None);
        assert!(listings[0].description.is_empty());
    }

    #[test]
    fn test_load_listings_by_extension() {
        let path = temp_path("block_rater_test_load.csv");
        fs::write(&path, CSV).unwrap();

        let listings = load_listings(&path).unwrap();
        assert_eq!(listings.len(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_listings_unknown_extension() {
        assert!(load_listings("listings.xml").is_err());
    }
}
