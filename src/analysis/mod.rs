/// Statistical analyses over the electrification store.
///
/// Every routine is read-only, takes the store plus explicit parameters,
/// and returns `Ok(None)` when its query matched no rows.
///
/// Submodules:
/// - `ols` — least squares and regression summaries.
/// - `regressions` — the cross-state regressions.
/// - `granger` — Granger causality of the price ratio on electrification.
/// - `decomposition` — between/within-sector variance decompositions.

pub mod decomposition;
pub mod granger;
pub mod ols;
pub mod regressions;

use crate::catalog::NATIONAL;
use crate::config::Config;
use crate::db::Store;
use crate::logging::{self, Stage};
use crate::model::AnalysisError;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by n).
pub fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Whether `values` are constant up to rounding: the centered sum of
/// squares is at most `n·ε·scale²`, where `scale` is the largest magnitude.
pub fn is_constant(values: &[f64]) -> bool {
    if values.is_empty() {
        return true;
    }
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let m = mean(values);
    let css: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    css <= f64::EPSILON * values.len() as f64 * scale * scale
}

/// Whether `from` and `to` differ by no more than rounding.
pub fn is_negligible_change(from: f64, to: f64) -> bool {
    (to - from).abs() <= f64::EPSILON * from.abs().max(to.abs())
}

/// First differences; one shorter than the input.
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Years in `first..=last` absent from `years`.
pub fn missing_years(years: &[i32], first: i32, last: i32) -> Vec<i32> {
    (first..=last).filter(|y| !years.contains(y)).collect()
}

pub fn check_contiguous(
    table: &str,
    state: &str,
    years: &[i32],
    first: i32,
    last: i32,
) -> Result<(), AnalysisError> {
    let missing = missing_years(years, first, last);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::NonContiguousYears {
            table: table.to_string(),
            state: state.to_string(),
            missing,
        })
    }
}

// ---------------------------------------------------------------------------
// Batch run
// ---------------------------------------------------------------------------

/// How each analysis in a batch run ended.
#[derive(Debug, Default)]
pub struct AnalysisRun {
    pub completed: Vec<&'static str>,
    /// Analyses whose query matched no rows.
    pub empty: Vec<&'static str>,
    pub failed: Vec<(&'static str, AnalysisError)>,
}

impl AnalysisRun {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record<T: std::fmt::Display>(&mut self, name: &'static str, result: Result<Option<T>, AnalysisError>) {
        match result {
            Ok(Some(value)) => {
                println!("{}\n", value);
                logging::info(Stage::Analysis, Some(name), "completed");
                self.completed.push(name);
            }
            Ok(None) => {
                println!("{}: no data\n", name);
                logging::warn(Stage::Analysis, Some(name), "query returned no rows");
                self.empty.push(name);
            }
            Err(err) => {
                logging::error(Stage::Analysis, Some(name), &err.to_string());
                self.failed.push((name, err));
            }
        }
    }
}

/// Run every analysis in order, printing each result. A failure is logged
/// and recorded, and the next analysis still runs.
pub fn run_all(store: &Store, config: &Config) -> AnalysisRun {
    let mut run = AnalysisRun::default();

    run.record(
        "price regression",
        regressions::price_elec_regression(store, config.analysis_year),
    );
    run.record(
        "gdp regression",
        regressions::gdp_elec_regression(store, config.analysis_year),
    );
    run.record(
        "energy growth regression",
        regressions::energy_elec_regression(store, config.analysis_year, config.baseline_year),
    );
    run.record(
        "granger causality",
        granger::granger_causality(store, NATIONAL, config.granger_max_lag),
    );
    run.record(
        "cross-section decomposition",
        decomposition::decompose_cross_section(store, config.analysis_year),
    );
    run.record(
        "time-series decomposition",
        decomposition::decompose_time_series(
            store,
            config.decomposition_first_year,
            config.decomposition_last_year,
        ),
    );

    logging::info(
        Stage::Analysis,
        None,
        &format!(
            "{} completed, {} empty, {} failed",
            run.completed.len(),
            run.empty.len(),
            run.failed.len()
        ),
    );
    run
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_variance() {
        assert_eq!(variance(&[1.0, 3.0]), 1.0);
        assert_eq!(variance(&[2.0, 2.0, 2.0]), 0.0);
    }

    #[test]
    fn test_repeated_values_are_constant_despite_rounding() {
        let values = vec![0.1; 50];
        // The mean of fifty 0.1s is not exactly 0.1
        assert!(variance(&values) > 0.0);
        assert!(is_constant(&values));
        assert!(is_constant(&[]));

        let mut spread = values.clone();
        spread[7] = 0.1000001;
        assert!(!is_constant(&spread));
        assert!(!is_constant(&(0..50).map(f64::from).collect::<Vec<_>>()));
    }

    #[test]
    fn test_negligible_change_allows_one_ulp() {
        assert!(is_negligible_change(0.3, 0.1 + 0.2));
        assert!(is_negligible_change(0.0, 0.0));
        assert!(!is_negligible_change(0.3, 0.3000001));
    }

    #[test]
    fn test_diff_shortens_by_one() {
        assert_eq!(diff(&[1.0, 4.0, 2.0]), vec![3.0, -2.0]);
        assert!(diff(&[1.0]).is_empty());
    }

    #[test]
    fn test_missing_years_lists_gaps() {
        assert_eq!(missing_years(&[1960, 1961, 1963, 1965], 1960, 1965), vec![1962, 1964]);
        assert!(check_contiguous("energy", "Ohio", &[2000, 2001], 2000, 2001).is_ok());
    }

    #[test]
    fn test_run_all_on_empty_store_fails_nothing() {
        let store = Store::open_in_memory().unwrap();
        store.create_tables().unwrap();
        let run = run_all(&store, &Config::default());
        assert!(run.is_success(), "failures: {:?}", run.failed);
        assert_eq!(run.empty.len(), 6);
    }
}
