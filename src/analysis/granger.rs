//! Granger causality test of the electricity/energy price ratio on
//! electrification.
//!
//! For each lag `p` the effect series is regressed on a constant and its own
//! `p` lags (restricted), then additionally on `p` lags of the cause
//! (unrestricted), over the `n − p` observations where every lag exists.
//! The SSR-based chi-squared statistic `nobs · (ssr_r − ssr_u) / ssr_u` is
//! compared against χ²(p).

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::fmt;

use super::ols::least_squares;
use super::{diff, missing_years};
use crate::catalog::Table;
use crate::db::Store;
use crate::model::AnalysisError;

const ROUTINE: &str = "granger causality";

#[derive(Debug, Clone, PartialEq)]
pub struct GrangerLag {
    pub lag: usize,
    pub statistic: f64,
    pub p_value: f64,
    pub nobs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrangerReport {
    pub state: String,
    pub first_year: i32,
    pub last_year: i32,
    pub lags: Vec<GrangerLag>,
    pub min_p_value: f64,
}

impl fmt::Display for GrangerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Granger causality: electricity price share → electrification ({}, {}–{}, differenced)",
            self.state, self.first_year, self.last_year
        )?;
        writeln!(f, "{:>5} {:>12} {:>12} {:>6}", "lag", "chi2", "p-value", "nobs")?;
        for lag in &self.lags {
            writeln!(
                f,
                "{:>5} {:>12.4} {:>12.6} {:>6}",
                lag.lag, lag.statistic, lag.p_value, lag.nobs
            )?;
        }
        write!(f, "minimum p-value: {:.6}", self.min_p_value)
    }
}

/// Minimum series length for `max_lag`: the longest lag must leave more
/// observations than the unrestricted model has parameters.
pub fn required_length(max_lag: usize) -> usize {
    3 * max_lag + 2
}

/// Test whether lags of `cause` improve prediction of `effect`, for every
/// lag from 1 to `max_lag`. Both series must already be stationary
/// (e.g. first-differenced) and aligned.
pub fn granger_test(
    effect: &[f64],
    cause: &[f64],
    max_lag: usize,
) -> Result<Vec<GrangerLag>, AnalysisError> {
    if effect.len() != cause.len() {
        return Err(AnalysisError::Degenerate {
            routine: ROUTINE,
            reason: format!("series lengths differ: {} vs {}", effect.len(), cause.len()),
        });
    }
    if max_lag == 0 || effect.len() < required_length(max_lag) {
        return Err(AnalysisError::InsufficientData {
            routine: ROUTINE,
            needed: required_length(max_lag.max(1)),
            available: effect.len(),
        });
    }

    let n = effect.len();
    let mut results = Vec::with_capacity(max_lag);

    for lag in 1..=max_lag {
        let nobs = n - lag;
        let y = DVector::from_fn(nobs, |i, _| effect[i + lag]);
        let restricted = DMatrix::from_fn(nobs, 1 + lag, |i, j| {
            let t = i + lag;
            if j == 0 { 1.0 } else { effect[t - j] }
        });
        let unrestricted = DMatrix::from_fn(nobs, 1 + 2 * lag, |i, j| {
            let t = i + lag;
            if j == 0 {
                1.0
            } else if j <= lag {
                effect[t - j]
            } else {
                cause[t - (j - lag)]
            }
        });

        let ssr_r = least_squares(&restricted, &y)?.ssr;
        let ssr_u = least_squares(&unrestricted, &y)?.ssr;
        if ssr_u <= 0.0 {
            return Err(AnalysisError::Degenerate {
                routine: ROUTINE,
                reason: format!("unrestricted model fits exactly at lag {}", lag),
            });
        }

        let statistic = nobs as f64 * (ssr_r - ssr_u) / ssr_u;
        let chi2 = ChiSquared::new(lag as f64).map_err(|e| AnalysisError::Degenerate {
            routine: ROUTINE,
            reason: format!("chi-squared distribution: {}", e),
        })?;
        results.push(GrangerLag {
            lag,
            statistic,
            p_value: chi2.sf(statistic.max(0.0)),
            nobs,
        });
    }

    Ok(results)
}

/// Granger test on a state's (electrification, electricity price share)
/// series. Returns `Ok(None)` when the state has no joined rows.
pub fn granger_causality(
    store: &Store,
    state: &str,
    max_lag: usize,
) -> Result<Option<GrangerReport>, AnalysisError> {
    let rows = store.joined_for_state(Table::Electrification, Table::ElectricityPriceShare, state)?;
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Ok(None);
    };
    let (first_year, last_year) = (first.0, last.0);

    let years: Vec<i32> = rows.iter().map(|r| r.0).collect();
    let missing = missing_years(&years, first_year, last_year);
    if !missing.is_empty() {
        return Err(AnalysisError::NonContiguousYears {
            table: format!("{} ⋈ {}", Table::Electrification, Table::ElectricityPriceShare),
            state: state.to_string(),
            missing,
        });
    }

    let electrification: Vec<f64> = rows.iter().map(|r| r.1).collect();
    let price_share: Vec<f64> = rows.iter().map(|r| r.2).collect();

    let lags = granger_test(&diff(&electrification), &diff(&price_share), max_lag)?;
    let min_p_value = lags.iter().map(|l| l.p_value).fold(f64::INFINITY, f64::min);

    Ok(Some(GrangerReport {
        state: state.to_string(),
        first_year,
        last_year,
        lags,
        min_p_value,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_walk_steps(rng: &mut StdRng, n: usize) -> Vec<f64> {
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn test_independent_series_rarely_reject() {
        // Differenced independent random walks are independent noise; at the
        // 5% level the test should reject in about 5% of cases.
        let mut rng = StdRng::seed_from_u64(2019);
        let mut rejections = 0;
        let mut total = 0;
        for _ in 0..40 {
            let effect = random_walk_steps(&mut rng, 60);
            let cause = random_walk_steps(&mut rng, 60);
            for lag in granger_test(&effect, &cause, 4).expect("enough data") {
                total += 1;
                if lag.p_value < 0.05 {
                    rejections += 1;
                }
            }
        }
        let rate = rejections as f64 / total as f64;
        assert!(rate < 0.25, "rejection rate {} is far above the nominal 5%", rate);
    }

    #[test]
    fn test_lagged_dependence_is_detected() {
        let mut rng = StdRng::seed_from_u64(7);
        let cause = random_walk_steps(&mut rng, 80);
        let noise = random_walk_steps(&mut rng, 80);
        let effect: Vec<f64> = (0..80)
            .map(|t| if t == 0 { noise[0] } else { 0.9 * cause[t - 1] + 0.1 * noise[t] })
            .collect();
        let lags = granger_test(&effect, &cause, 3).unwrap();
        assert!(lags.iter().all(|l| l.p_value < 1e-6), "got {:?}", lags);
    }

    #[test]
    fn test_nobs_shrinks_with_lag() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = random_walk_steps(&mut rng, 30);
        let b = random_walk_steps(&mut rng, 30);
        let lags = granger_test(&a, &b, 5).unwrap();
        let nobs: Vec<usize> = lags.iter().map(|l| l.nobs).collect();
        assert_eq!(nobs, vec![29, 28, 27, 26, 25]);
    }

    #[test]
    fn test_too_short_for_lag_is_insufficient() {
        let series = vec![0.1; 46];
        let result = granger_test(&series, &series, 15);
        assert_eq!(
            result,
            Err(AnalysisError::InsufficientData {
                routine: ROUTINE,
                needed: 47,
                available: 46
            })
        );
    }

    #[test]
    fn test_empty_state_returns_none() {
        let store = Store::open_in_memory().unwrap();
        store.create_tables().unwrap();
        assert_eq!(granger_causality(&store, "United States", 15).unwrap(), None);
    }
}
