//! Cross-state regressions of electrification for a single year.

use std::collections::HashMap;
use std::fmt;

use super::ols::{self, OlsFit};
use crate::catalog::{Table, DISTRICT_OF_COLUMBIA, NATIONAL};
use crate::db::Store;
use crate::model::AnalysisError;

/// A fitted cross-state regression and the data it was fitted on.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionResult {
    pub name: &'static str,
    pub dependent: &'static str,
    pub predictor: &'static str,
    pub year: i32,
    /// States in row order of `x` and `y`.
    pub states: Vec<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub fit: OlsFit,
}

impl fmt::Display for RegressionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!(
            "{} ({}, {} states): {} ~ {}",
            self.name,
            self.year,
            self.states.len(),
            self.dependent,
            self.predictor
        );
        f.write_str(&self.fit.summary(&title, &[self.predictor]))
    }
}

fn regress(
    name: &'static str,
    dependent: &'static str,
    predictor: &'static str,
    year: i32,
    rows: Vec<(String, f64, f64)>,
) -> Result<Option<RegressionResult>, AnalysisError> {
    if rows.is_empty() {
        return Ok(None);
    }
    let mut states = Vec::with_capacity(rows.len());
    let mut x = Vec::with_capacity(rows.len());
    let mut y = Vec::with_capacity(rows.len());
    for (state, dep, pred) in rows {
        states.push(state);
        y.push(dep);
        x.push(pred);
    }
    let fit = ols::fit(&x, &y)?;
    Ok(Some(RegressionResult {
        name,
        dependent,
        predictor,
        year,
        states,
        x,
        y,
        fit,
    }))
}

/// Electrification against the electricity/energy price ratio, across
/// every state except the national aggregate.
pub fn price_elec_regression(store: &Store, year: i32) -> Result<Option<RegressionResult>, AnalysisError> {
    let rows = store.joined_for_year(Table::Electrification, Table::ElectricityPriceShare, year, &[NATIONAL])?;
    regress("Electrification vs. price ratio", "Elec", "ElecPriceShare", year, rows)
}

/// Electrification against GDP per capita. The District of Columbia is an
/// outlier on GDP per capita and is left out along with the national row.
pub fn gdp_elec_regression(store: &Store, year: i32) -> Result<Option<RegressionResult>, AnalysisError> {
    let rows = store.joined_for_year(
        Table::Electrification,
        Table::GdpPerCapita,
        year,
        &[NATIONAL, DISTRICT_OF_COLUMBIA],
    )?;
    regress("Electrification vs. GDP per capita", "Elec", "GDPCap", year, rows)
}

/// Electrification in `year` against relative growth in total energy
/// consumption since `baseline_year`, `(E_year − E_base) / E_base`.
pub fn energy_elec_regression(
    store: &Store,
    year: i32,
    baseline_year: i32,
) -> Result<Option<RegressionResult>, AnalysisError> {
    const ROUTINE: &str = "energy growth regression";

    let current = store.joined_for_year(Table::Electrification, Table::Energy, year, &[NATIONAL])?;
    if current.is_empty() {
        return Ok(None);
    }

    let baseline: HashMap<String, f64> = store
        .values_for_year(Table::Energy, baseline_year, &[NATIONAL])?
        .into_iter()
        .map(|sv| (sv.state, sv.value))
        .collect();

    let mut rows = Vec::with_capacity(current.len());
    for (state, elec, energy) in current {
        let base = *baseline.get(&state).ok_or_else(|| AnalysisError::MissingData {
            table: Table::Energy.name().to_string(),
            state: state.clone(),
            year: Some(baseline_year),
        })?;
        if base == 0.0 {
            return Err(AnalysisError::Degenerate {
                routine: ROUTINE,
                reason: format!("{} has zero energy consumption in {}", state, baseline_year),
            });
        }
        let growth = (energy - base) / base;
        rows.push((state, elec, growth));
    }

    regress("Electrification vs. energy growth", "Elec", "EnergyDiff", year, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Observation;

    fn store_with(tables: &[(Table, Vec<Observation>)]) -> Store {
        let mut store = Store::open_in_memory().unwrap();
        store.create_tables().unwrap();
        for (table, rows) in tables {
            store.insert_observations(*table, rows).unwrap();
        }
        store
    }

    fn obs(rows: &[(&str, i32, f64)]) -> Vec<Observation> {
        rows.iter().map(|(s, y, v)| Observation::new(s, *y, *v)).collect()
    }

    #[test]
    fn test_price_regression_excludes_national_row() {
        let store = store_with(&[
            (
                Table::Electrification,
                obs(&[
                    ("Alabama", 2019, 0.21),
                    ("Alaska", 2019, 0.12),
                    ("Arizona", 2019, 0.24),
                    ("Arkansas", 2019, 0.19),
                    ("United States", 2019, 99.0),
                ]),
            ),
            (
                Table::ElectricityPriceShare,
                obs(&[
                    ("Alabama", 2019, 1.9),
                    ("Alaska", 2019, 3.0),
                    ("Arizona", 2019, 1.6),
                    ("Arkansas", 2019, 2.1),
                    ("United States", 2019, 0.0),
                ]),
            ),
        ]);
        let result = price_elec_regression(&store, 2019).unwrap().expect("rows exist");
        assert_eq!(result.states, vec!["Alabama", "Alaska", "Arizona", "Arkansas"]);
        assert_eq!(result.fit.nobs, 4);
        assert!(result.fit.slope() < 0.0, "higher relative price, lower electrification");
    }

    #[test]
    fn test_gdp_regression_excludes_district_of_columbia() {
        let store = store_with(&[
            (
                Table::Electrification,
                obs(&[
                    ("Iowa", 2019, 0.15),
                    ("Ohio", 2019, 0.18),
                    ("Utah", 2019, 0.20),
                    ("District of Columbia", 2019, 0.40),
                ]),
            ),
            (
                Table::GdpPerCapita,
                obs(&[
                    ("Iowa", 2019, 0.060),
                    ("Ohio", 2019, 0.058),
                    ("Utah", 2019, 0.056),
                    ("District of Columbia", 2019, 0.200),
                ]),
            ),
        ]);
        let result = gdp_elec_regression(&store, 2019).unwrap().unwrap();
        assert!(!result.states.iter().any(|s| s == DISTRICT_OF_COLUMBIA));
        assert_eq!(result.fit.nobs, 3);
    }

    #[test]
    fn test_energy_growth_joins_baseline_by_state() {
        // Baseline rows are inserted in a different order from the
        // current-year rows; growth must still pair by name.
        let store = store_with(&[
            (
                Table::Electrification,
                obs(&[("Iowa", 2019, 0.10), ("Ohio", 2019, 0.20), ("Utah", 2019, 0.30)]),
            ),
            (
                Table::Energy,
                obs(&[
                    ("Utah", 2009, 100.0),
                    ("Iowa", 2009, 200.0),
                    ("Ohio", 2009, 400.0),
                    ("Iowa", 2019, 220.0),
                    ("Ohio", 2019, 480.0),
                    ("Utah", 2019, 130.0),
                ]),
            ),
        ]);
        let result = energy_elec_regression(&store, 2019, 2009).unwrap().unwrap();
        assert_eq!(result.states, vec!["Iowa", "Ohio", "Utah"]);
        let expected = [0.1, 0.2, 0.3];
        for (got, want) in result.x.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "growth {} vs {}", got, want);
        }
        assert!((result.fit.slope() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_energy_growth_missing_baseline_is_named() {
        let store = store_with(&[
            (
                Table::Electrification,
                obs(&[("Iowa", 2019, 0.10), ("Ohio", 2019, 0.20), ("Utah", 2019, 0.30)]),
            ),
            (
                Table::Energy,
                obs(&[
                    ("Iowa", 2009, 200.0),
                    ("Utah", 2009, 100.0),
                    ("Iowa", 2019, 220.0),
                    ("Ohio", 2019, 480.0),
                    ("Utah", 2019, 130.0),
                ]),
            ),
        ]);
        assert_eq!(
            energy_elec_regression(&store, 2019, 2009),
            Err(AnalysisError::MissingData {
                table: "energy".into(),
                state: "Ohio".into(),
                year: Some(2009),
            })
        );
    }

    #[test]
    fn test_empty_year_returns_none() {
        let store = store_with(&[]);
        assert_eq!(price_elec_regression(&store, 1850).unwrap(), None);
        assert_eq!(gdp_elec_regression(&store, 1850).unwrap(), None);
        assert_eq!(energy_elec_regression(&store, 1850, 1840).unwrap(), None);
    }
}
