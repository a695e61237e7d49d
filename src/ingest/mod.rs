//! Ingestion stage: fetch every primary series for every state, load it into
//! the store, then compute the derived quotient tables.
//!
//! A failed (state, series) pair is logged and recorded in the
//! `IngestReport`; the remaining pairs are still fetched. Store errors are
//! fatal and returned to the caller.

pub mod eia;

use crate::catalog::{Table, SERIES_CATALOG, STATE_REGISTRY, ZERO_FILLED};
use crate::config::Config;
use crate::db::Store;
use crate::logging::{self, Stage};
use crate::model::EiaError;

use eia::{build_series_id, filter_years, SeriesFetcher};

/// One (state, series) pair that could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub state: String,
    pub series_id: String,
    pub table: Table,
    /// What the series measures, from the catalog.
    pub description: &'static str,
    pub error: EiaError,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// (state, series) pairs requested.
    pub attempted: usize,
    pub succeeded: usize,
    /// Primary rows added (fetched plus zero-filled).
    pub rows_inserted: usize,
    /// Derived rows added by the quotient pass.
    pub derived_rows: usize,
    pub failures: Vec<FetchFailure>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn print_summary(&self) {
        println!();
        println!("Ingestion summary");
        println!("  series loaded:  {}/{}", self.succeeded, self.attempted);
        println!("  rows inserted:  {}", self.rows_inserted);
        println!("  derived rows:   {}", self.derived_rows);
        if !self.failures.is_empty() {
            println!("  failed series ({}):", self.failures.len());
            for failure in &self.failures {
                println!(
                    "    - {} [{}] ({} → {}): {}",
                    failure.series_id, failure.description, failure.state, failure.table, failure.error
                );
            }
        }
    }
}

/// Run the full ingestion stage against `store`.
pub fn run_ingestion(
    store: &mut Store,
    fetcher: &dyn SeriesFetcher,
    config: &Config,
) -> rusqlite::Result<IngestReport> {
    store.create_tables()?;

    let mut report = IngestReport::default();

    for state in STATE_REGISTRY {
        logging::info(Stage::Eia, None, state.name);

        for spec in SERIES_CATALOG {
            let series_id = build_series_id(spec.msn, state.code);
            report.attempted += 1;

            match fetcher.fetch_series(spec.msn, state.name, state.code) {
                Ok(observations) => {
                    let observations = filter_years(observations, config.first_year, config.end_year);
                    let inserted = store.insert_observations(spec.table, &observations)?;
                    logging::debug(
                        Stage::Store,
                        Some(&series_id),
                        &format!("{} rows into {} ({} new)", observations.len(), spec.table, inserted),
                    );
                    report.rows_inserted += inserted;
                    report.succeeded += 1;
                }
                Err(err) => {
                    logging::log_eia_failure(&series_id, &format!("fetch of {}", spec.description), &err);
                    report.failures.push(FetchFailure {
                        state: state.name.to_string(),
                        series_id,
                        table: spec.table,
                        description: spec.description,
                        error: err,
                    });
                }
            }
        }

        for table in ZERO_FILLED {
            report.rows_inserted += store.insert_zero_series(*table, state.name, config.years())?;
        }
    }

    report.derived_rows = store.build_derived_tables()?;

    logging::log_ingest_summary(report.attempted, report.succeeded, report.failures.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Observation;

    /// Serves a fixed value per series for every state, failing one pair.
    struct CannedFetcher {
        failing: (&'static str, &'static str),
    }

    impl SeriesFetcher for CannedFetcher {
        fn fetch_series(
            &self,
            msn: &str,
            state_name: &str,
            state_code: &str,
        ) -> Result<Vec<Observation>, EiaError> {
            if (msn, state_code) == self.failing {
                return Err(EiaError::HttpError(500));
            }
            let base = match msn {
                "TETCB" => 100.0,
                "ESTCB" => 20.0,
                _ => 10.0,
            };
            Ok(vec![
                Observation::new(state_name, 1959, base),
                Observation::new(state_name, 1960, base),
                Observation::new(state_name, 1961, base + 1.0),
            ])
        }
    }

    fn small_config() -> Config {
        Config {
            first_year: 1960,
            end_year: 1962,
            ..Config::default()
        }
    }

    #[test]
    fn test_one_failed_pair_does_not_abort_the_run() {
        let mut store = Store::open_in_memory().unwrap();
        let fetcher = CannedFetcher { failing: ("TETCB", "OH") };
        let report = run_ingestion(&mut store, &fetcher, &small_config()).unwrap();

        assert_eq!(report.attempted, STATE_REGISTRY.len() * SERIES_CATALOG.len());
        assert_eq!(report.succeeded, report.attempted - 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].series_id, "SEDS.TETCB.OH.A");
        assert_eq!(report.failures[0].table, Table::Energy);
        assert_eq!(report.failures[0].description, "Total energy consumption");

        // Ohio has no energy rows, so no electrification either; others do
        assert_eq!(store.value_at(Table::Electrification, "Ohio", 1960).unwrap(), None);
        assert_eq!(store.value_at(Table::Electrification, "Texas", 1960).unwrap(), Some(0.2));
    }

    #[test]
    fn test_years_outside_range_are_dropped() {
        let mut store = Store::open_in_memory().unwrap();
        let fetcher = CannedFetcher { failing: ("", "") };
        run_ingestion(&mut store, &fetcher, &small_config()).unwrap();
        assert_eq!(store.years_for_state(Table::Energy, "Iowa").unwrap(), vec![1960, 1961]);
        assert_eq!(
            store.years_for_state(Table::ElectricElectricity, "Iowa").unwrap(),
            vec![1960, 1961]
        );
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let mut store = Store::open_in_memory().unwrap();
        let fetcher = CannedFetcher { failing: ("", "") };
        let first = run_ingestion(&mut store, &fetcher, &small_config()).unwrap();
        let snapshot: Vec<_> = Table::ALL.iter().map(|t| store.rows(*t).unwrap()).collect();

        let second = run_ingestion(&mut store, &fetcher, &small_config()).unwrap();
        assert!(first.rows_inserted > 0);
        assert_eq!(second.rows_inserted, 0);
        assert_eq!(second.derived_rows, 0);
        let after: Vec<_> = Table::ALL.iter().map(|t| store.rows(*t).unwrap()).collect();
        assert_eq!(snapshot, after);
    }
}
