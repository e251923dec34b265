use catalogo_core::VehicleFilter;

/// Global listing version counter.
pub const VERSION_KEY: &str = "veiculos:version";

pub const LISTING_PREFIX: &str = "veiculos:list:";

/// Key for one listing page under `version`.
///
/// The filter values are JSON-encoded, so values containing `:` or quotes
/// cannot make two different requests share a key.
pub fn listing_key(version: i64, filter: &VehicleFilter, page: u64, limit: u64) -> String {
    let parts = serde_json::json!([
        filter.brand,
        filter.vehicle_type,
        filter.year,
        page,
        limit
    ]);
    format!("{LISTING_PREFIX}v{version}:{parts}")
}

/// Glob matching every page cached under `version`.
pub fn listing_pattern(version: i64) -> String {
    format!("{LISTING_PREFIX}v{version}:*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let filter = VehicleFilter::default().with_brand("fiat").with_year(2020);
        assert_eq!(
            listing_key(3, &filter, 2, 10),
            r#"veiculos:list:v3:["fiat",null,2020,2,10]"#
        );
    }

    #[test]
    fn test_distinct_inputs_distinct_keys() {
        let a = VehicleFilter::default().with_brand("a:b").with_type("c");
        let b = VehicleFilter::default().with_brand("a").with_type("b:c");
        assert_ne!(listing_key(1, &a, 1, 10), listing_key(1, &b, 1, 10));

        let quoted = VehicleFilter::default().with_brand(r#"x","y"#);
        let split = VehicleFilter::default().with_brand("x").with_type("y");
        assert_ne!(listing_key(1, &quoted, 1, 10), listing_key(1, &split, 1, 10));
    }

    #[test]
    fn test_version_scopes_keys() {
        let filter = VehicleFilter::default();
        assert_ne!(listing_key(1, &filter, 1, 10), listing_key(2, &filter, 1, 10));
        let pattern = listing_pattern(1);
        let pattern = pattern.trim_end_matches('*');
        assert!(listing_key(1, &filter, 1, 10).starts_with(pattern));
        assert!(!listing_key(11, &filter, 1, 10).starts_with(pattern));
    }
}
