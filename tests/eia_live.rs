/// Live tests against the EIA series API
///
/// Prerequisites:
/// - EIA_API_KEY set in the environment or in .env
/// - Internet connectivity to reach api.eia.gov
///
/// Run with: cargo test --test eia_live -- --ignored
///
/// Note: the API may be slow, rate-limited, or retired for the v1 series
/// endpoint; a failure here does not indicate a parsing regression.

use electrification::config::{self, Config};
use electrification::db::Store;
use electrification::catalog::Table;
use electrification::ingest::eia::{EiaClient, SeriesFetcher};

fn live_client() -> EiaClient {
    let key = config::api_key().expect("EIA_API_KEY must be set for live tests");
    EiaClient::new(&Config::default(), key).expect("HTTP client should build")
}

#[test]
#[ignore]
fn test_fetch_total_energy_for_ohio() {
    let observations = live_client()
        .fetch_series("TETCB", "Ohio", "OH")
        .expect("SEDS.TETCB.OH.A should be available");

    assert!(observations.len() > 50, "only {} years returned", observations.len());
    assert!(observations.iter().all(|o| o.state == "Ohio"));
    assert!(observations.iter().any(|o| o.year == 2019));
}

#[test]
#[ignore]
fn test_fetched_series_loads_into_store() {
    let observations = live_client()
        .fetch_series("ESTCB", "United States", "US")
        .expect("SEDS.ESTCB.US.A should be available");

    let mut store = Store::open_in_memory().unwrap();
    store.create_tables().unwrap();
    let inserted = store.insert_observations(Table::Electricity, &observations).unwrap();
    assert_eq!(inserted, observations.len());
    assert!(store.value_at(Table::Electricity, "United States", 2019).unwrap().is_some());
}
