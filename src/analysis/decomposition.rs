//! Decomposition of electrification into a between-sector part (the mix of
//! end-use sectors) and a within-sector part (electrification rates inside
//! each sector).
//!
//! Electrification of a region is `Σ_s share_s · rate_s` where `share_s` is
//! sector energy over total energy and `rate_s` is sector electricity over
//! sector energy. Holding one factor at the national value isolates the
//! other.

use std::collections::HashMap;
use std::fmt;

use super::{check_contiguous, is_constant, is_negligible_change, variance};
use crate::catalog::{Sector, Table, NATIONAL};
use crate::db::Store;
use crate::model::AnalysisError;

/// Share of total energy and electrification rate of one sector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorInputs {
    pub share: f64,
    pub rate: f64,
}

/// Inputs of one state for the cross-sectional decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct StateInputs {
    pub state: String,
    pub electrification: f64,
    /// Indexed in `Sector::ALL` order.
    pub sectors: [SectorInputs; 4],
}

/// National inputs for one year of the time-series decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct YearInputs {
    pub year: i32,
    pub electrification: f64,
    pub sectors: [SectorInputs; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceParts {
    pub total_variance: f64,
    pub shares_fixed_variance: f64,
    pub rate_fixed_variance: f64,
    pub within_share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionDecomposition {
    pub year: i32,
    pub states: Vec<String>,
    pub total_variance: f64,
    pub shares_fixed_variance: f64,
    pub rate_fixed_variance: f64,
    /// Fraction of cross-state variance due to differing within-sector rates.
    pub within_share: f64,
}

impl fmt::Display for CrossSectionDecomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cross-state variance decomposition ({}, {} states)", self.year, self.states.len())?;
        writeln!(f, "  variance of electrification:       {:.6e}", self.total_variance)?;
        writeln!(f, "  variance with national shares:     {:.6e}", self.shares_fixed_variance)?;
        writeln!(f, "  variance with national rates:      {:.6e}", self.rate_fixed_variance)?;
        write!(
            f,
            "Variance due to varying electrification rates within sectors: {:.4}",
            self.within_share
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesDecomposition {
    pub first_year: i32,
    pub last_year: i32,
    /// Within-sector fraction of each year-over-year change.
    pub steps: Vec<f64>,
    pub mean_within: f64,
}

impl fmt::Display for TimeSeriesDecomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Share of national electrification change within sectors ({}–{}, {} steps): {:.4}",
            self.first_year,
            self.last_year,
            self.steps.len(),
            self.mean_within
        )
    }
}

fn weighted(shares: &[SectorInputs; 4], rates: &[SectorInputs; 4]) -> f64 {
    shares.iter().zip(rates).map(|(s, r)| s.share * r.rate).sum()
}

// ---------------------------------------------------------------------------
// Pure cores
// ---------------------------------------------------------------------------

/// Cross-sectional decomposition over `states` against the `national`
/// sector mix and rates.
pub fn cross_section_within_share(
    national: &[SectorInputs; 4],
    states: &[StateInputs],
) -> Result<VarianceParts, AnalysisError> {
    const ROUTINE: &str = "cross-section decomposition";

    if states.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            routine: ROUTINE,
            needed: 2,
            available: states.len(),
        });
    }

    let shares_fixed: Vec<f64> = states.iter().map(|s| weighted(national, &s.sectors)).collect();
    let rate_fixed: Vec<f64> = states.iter().map(|s| weighted(&s.sectors, national)).collect();
    let overall: Vec<f64> = states.iter().map(|s| s.electrification).collect();

    let total_variance = variance(&overall);
    if is_constant(&overall) {
        return Err(AnalysisError::Degenerate {
            routine: ROUTINE,
            reason: "electrification is identical in every state".into(),
        });
    }
    let shares_fixed_variance = variance(&shares_fixed);
    let rate_fixed_variance = variance(&rate_fixed);

    Ok(VarianceParts {
        total_variance,
        shares_fixed_variance,
        rate_fixed_variance,
        within_share: (shares_fixed_variance + (total_variance - rate_fixed_variance)) / 2.0 / total_variance,
    })
}

/// Within-sector fraction of each consecutive change in `years`, which must
/// be ordered and contiguous.
pub fn time_series_within_share(years: &[YearInputs]) -> Result<Vec<f64>, AnalysisError> {
    const ROUTINE: &str = "time-series decomposition";

    if years.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            routine: ROUTINE,
            needed: 2,
            available: years.len(),
        });
    }

    let mut steps = Vec::with_capacity(years.len() - 1);
    for pair in years.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let change = next.electrification - prev.electrification;
        if is_negligible_change(prev.electrification, next.electrification) {
            return Err(AnalysisError::Degenerate {
                routine: ROUTINE,
                reason: format!("electrification unchanged from {} to {}", prev.year, next.year),
            });
        }
        let d1 = weighted(&prev.sectors, &next.sectors) - weighted(&prev.sectors, &prev.sectors);
        let d2 = weighted(&next.sectors, &next.sectors) - weighted(&next.sectors, &prev.sectors);
        steps.push((d1 + d2) / 2.0 / change);
    }
    Ok(steps)
}

// ---------------------------------------------------------------------------
// Store loaders
// ---------------------------------------------------------------------------

fn sector_rate(
    routine: &'static str,
    state: &str,
    sector: Sector,
    electricity: f64,
    energy: f64,
) -> Result<f64, AnalysisError> {
    if energy == 0.0 {
        return Err(AnalysisError::Degenerate {
            routine,
            reason: format!("{} has zero {} energy", state, sector.label().to_lowercase()),
        });
    }
    Ok(electricity / energy)
}

fn required(store: &Store, table: Table, state: &str, year: i32) -> Result<f64, AnalysisError> {
    store.value_at(table, state, year)?.ok_or_else(|| AnalysisError::MissingData {
        table: table.name().to_string(),
        state: state.to_string(),
        year: Some(year),
    })
}

/// Decompose the cross-state variance of electrification in `year`.
/// Returns `Ok(None)` when no state has an electrification row that year.
pub fn decompose_cross_section(store: &Store, year: i32) -> Result<Option<CrossSectionDecomposition>, AnalysisError> {
    const ROUTINE: &str = "cross-section decomposition";

    let electrification = store.values_for_year(Table::Electrification, year, &[NATIONAL])?;
    if electrification.is_empty() {
        return Ok(None);
    }

    let mut national = [SectorInputs { share: 0.0, rate: 0.0 }; 4];
    for (slot, sector) in national.iter_mut().zip(Sector::ALL) {
        let share = required(store, sector.share_table(), NATIONAL, year)?;
        let electricity = required(store, sector.electricity_table(), NATIONAL, year)?;
        let energy = required(store, sector.energy_table(), NATIONAL, year)?;
        *slot = SectorInputs {
            share,
            rate: sector_rate(ROUTINE, NATIONAL, sector, electricity, energy)?,
        };
    }

    let load = |table: Table| -> Result<HashMap<String, f64>, AnalysisError> {
        Ok(store
            .values_for_year(table, year, &[NATIONAL])?
            .into_iter()
            .map(|sv| (sv.state, sv.value))
            .collect())
    };
    let mut by_sector = Vec::with_capacity(Sector::ALL.len());
    for sector in Sector::ALL {
        by_sector.push((
            sector,
            load(sector.share_table())?,
            load(sector.electricity_table())?,
            load(sector.energy_table())?,
        ));
    }

    let lookup = |map: &HashMap<String, f64>, table: Table, state: &str| -> Result<f64, AnalysisError> {
        map.get(state).copied().ok_or_else(|| AnalysisError::MissingData {
            table: table.name().to_string(),
            state: state.to_string(),
            year: Some(year),
        })
    };

    let mut states = Vec::with_capacity(electrification.len());
    for sv in electrification {
        let mut sectors = [SectorInputs { share: 0.0, rate: 0.0 }; 4];
        for (slot, (sector, shares, electricity, energy)) in sectors.iter_mut().zip(&by_sector) {
            let share = lookup(shares, sector.share_table(), &sv.state)?;
            let elec = lookup(electricity, sector.electricity_table(), &sv.state)?;
            let en = lookup(energy, sector.energy_table(), &sv.state)?;
            *slot = SectorInputs {
                share,
                rate: sector_rate(ROUTINE, &sv.state, *sector, elec, en)?,
            };
        }
        states.push(StateInputs {
            state: sv.state,
            electrification: sv.value,
            sectors,
        });
    }

    let parts = cross_section_within_share(&national, &states)?;
    Ok(Some(CrossSectionDecomposition {
        year,
        states: states.into_iter().map(|s| s.state).collect(),
        total_variance: parts.total_variance,
        shares_fixed_variance: parts.shares_fixed_variance,
        rate_fixed_variance: parts.rate_fixed_variance,
        within_share: parts.within_share,
    }))
}

/// National series for `table` restricted to `first..=last`, keyed by year,
/// after checking that no year is missing.
fn contiguous_national(
    store: &Store,
    table: Table,
    first: i32,
    last: i32,
) -> Result<HashMap<i32, f64>, AnalysisError> {
    let series: HashMap<i32, f64> = store
        .series_for_state(table, NATIONAL)?
        .into_iter()
        .filter(|yv| yv.year >= first && yv.year <= last)
        .map(|yv| (yv.year, yv.value))
        .collect();
    let mut years: Vec<i32> = series.keys().copied().collect();
    years.sort_unstable();
    check_contiguous(table.name(), NATIONAL, &years, first, last)?;
    Ok(series)
}

/// Average within-sector fraction of the national year-over-year changes in
/// electrification from `first_year` to `last_year`. Returns `Ok(None)` when
/// there is no national electrification in that range.
pub fn decompose_time_series(
    store: &Store,
    first_year: i32,
    last_year: i32,
) -> Result<Option<TimeSeriesDecomposition>, AnalysisError> {
    const ROUTINE: &str = "time-series decomposition";

    let has_rows = store
        .years_for_state(Table::Electrification, NATIONAL)?
        .iter()
        .any(|y| (first_year..=last_year).contains(y));
    if !has_rows {
        return Ok(None);
    }

    let electrification = contiguous_national(store, Table::Electrification, first_year, last_year)?;
    let mut sector_series = Vec::with_capacity(Sector::ALL.len());
    for sector in Sector::ALL {
        sector_series.push((
            sector,
            contiguous_national(store, sector.share_table(), first_year, last_year)?,
            contiguous_national(store, sector.electricity_table(), first_year, last_year)?,
            contiguous_national(store, sector.energy_table(), first_year, last_year)?,
        ));
    }

    let mut years = Vec::new();
    for year in first_year..=last_year {
        let mut sectors = [SectorInputs { share: 0.0, rate: 0.0 }; 4];
        for (slot, (sector, shares, electricity, energy)) in sectors.iter_mut().zip(&sector_series) {
            *slot = SectorInputs {
                share: shares[&year],
                rate: sector_rate(ROUTINE, NATIONAL, *sector, electricity[&year], energy[&year])?,
            };
        }
        years.push(YearInputs {
            year,
            electrification: electrification[&year],
            sectors,
        });
    }

    let steps = time_series_within_share(&years)?;
    let mean_within = super::mean(&steps);
    Ok(Some(TimeSeriesDecomposition {
        first_year,
        last_year,
        steps,
        mean_within,
    }))
}
