//! # Scaleway API Client
//!
//! Minimal REST client for the Scaleway RDB product API.
//!
//! The client is credentialled from `SCW_*` environment variables and maps
//! Scaleway error responses onto typed [`Error`] kinds; the reconciler's
//! classifier consumes those kinds to pick a retry schedule.

mod client;
mod error;
mod rdb;
pub mod types;

pub use client::Client;
pub use error::Error;
pub use rdb::RdbApi;

/// Regions the RDB product is available in
pub const REGIONS: &[&str] = &["fr-par", "nl-ams", "pl-waw"];

/// Parse a region string against the known regions
pub fn parse_region(input: &str) -> Option<&'static str> {
    REGIONS.iter().copied().find(|region| *region == input)
}

#[cfg(test)]
mod tests {
    use super::parse_region;

    #[test]
    fn parse_region_knows_rdb_regions() {
        assert_eq!(parse_region("fr-par"), Some("fr-par"));
        assert_eq!(parse_region("us-east"), None);
        assert_eq!(parse_region(""), None);
    }
}
