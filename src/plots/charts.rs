/// The fixed set of report charts.
///
/// Builders only query the store and transform values; rendering happens
/// in `render`. Electrification is shown as a share of primary energy
/// (`100 × factor × value`) wherever the axis is a percentage.

use super::{
    to_primary_percent, Annotation, Chart, LineChart, LineSeriesSpec, PlotError, ScatterChart, BLACK, GREY,
};
use crate::catalog::{Sector, Table, NATIONAL};
use crate::config::Config;
use crate::db::Store;

pub type BuildFn = fn(&Store, &Config) -> Result<Chart, PlotError>;

pub struct ChartJob {
    pub file_name: &'static str,
    pub build: BuildFn,
}

pub const CHARTS: &[ChartJob] = &[
    ChartJob { file_name: "us_elec100.svg", build: |s, c| us_electrification(s, c.primary_energy_factor) },
    ChartJob { file_name: "us_elec_states.svg", build: |s, c| state_electrification(s, c.primary_energy_factor) },
    ChartJob { file_name: "us_elec_price.svg", build: |s, _| us_price_ratio(s) },
    ChartJob {
        file_name: "elec_elec_price_state.svg",
        build: |s, c| price_ratio_by_state(s, c.analysis_year, c.primary_energy_factor),
    },
    ChartJob {
        file_name: "elec_gdp_capita.png",
        build: |s, c| electrification_scatter(s, c.analysis_year, Table::GdpPerCapita, "GDP Per Capita"),
    },
    ChartJob {
        file_name: "elec_transpo.png",
        build: |s, c| electrification_scatter(s, c.analysis_year, Table::TransportationShare, "Transportation Share"),
    },
    ChartJob {
        file_name: "elec_industry.png",
        build: |s, c| electrification_scatter(s, c.analysis_year, Table::IndustrialShare, "Industrial Share"),
    },
    ChartJob {
        file_name: "elec_res.png",
        build: |s, c| electrification_scatter(s, c.analysis_year, Table::ResidentialShare, "Residential Share"),
    },
    ChartJob {
        file_name: "elec_comm.png",
        build: |s, c| electrification_scatter(s, c.analysis_year, Table::CommercialShare, "Commercial Share"),
    },
    ChartJob { file_name: "elec_by_sector.svg", build: |s, c| sector_electrification(s, c.primary_energy_factor) },
];

fn national_line(
    store: &Store,
    table: Table,
    label: &str,
    transform: impl Fn(f64) -> f64,
) -> Result<LineSeriesSpec, PlotError> {
    let points = store
        .series_for_state(table, NATIONAL)?
        .into_iter()
        .map(|yv| (f64::from(yv.year), transform(yv.value)))
        .collect();
    Ok(LineSeriesSpec::new(label, points))
}

/// National electrification, 0–100 %.
pub fn us_electrification(store: &Store, factor: f64) -> Result<Chart, PlotError> {
    let line = national_line(store, Table::Electrification, NATIONAL, |v| to_primary_percent(v, factor))?;
    Ok(Chart::Line(LineChart {
        title: Some("Electrification in the United States".into()),
        x_label: String::new(),
        y_label: "Electrification Rate".into(),
        series: vec![line],
        y_range: Some((0.0, 100.0)),
        percent_axis: true,
        annotations: Vec::new(),
    }))
}

/// Every state as a thin translucent line under a thick national line.
pub fn state_electrification(store: &Store, factor: f64) -> Result<Chart, PlotError> {
    let mut series = Vec::new();
    for state in store.distinct_states(Table::Electrification)? {
        if state == NATIONAL {
            continue;
        }
        let points = store
            .series_for_state(Table::Electrification, &state)?
            .into_iter()
            .map(|yv| (f64::from(yv.year), to_primary_percent(yv.value, factor)))
            .collect();
        series.push(LineSeriesSpec {
            alpha: 0.5,
            ..LineSeriesSpec::new(state, points)
        });
    }

    let national = national_line(store, Table::Electrification, NATIONAL, |v| to_primary_percent(v, factor))?;
    if !national.points.is_empty() {
        series.push(LineSeriesSpec {
            width: 5,
            color: BLACK,
            ..national
        });
    }

    Ok(Chart::Line(LineChart {
        title: Some("Electrification in the US and States".into()),
        x_label: String::new(),
        y_label: "Electrification Rate".into(),
        series,
        y_range: None,
        percent_axis: true,
        annotations: Vec::new(),
    }))
}

/// National electricity/energy price ratio.
pub fn us_price_ratio(store: &Store) -> Result<Chart, PlotError> {
    let line = national_line(store, Table::ElectricityPriceShare, NATIONAL, |v| v)?;
    Ok(Chart::Line(LineChart {
        title: Some("United States Electricity-Energy Price Ratio".into()),
        x_label: String::new(),
        y_label: String::new(),
        series: vec![line],
        y_range: None,
        percent_axis: false,
        annotations: Vec::new(),
    }))
}

/// Electrification (% of primary energy) against the price ratio, one point
/// per state.
pub fn price_ratio_by_state(store: &Store, year: i32, factor: f64) -> Result<Chart, PlotError> {
    let points = store
        .joined_for_year(Table::Electrification, Table::ElectricityPriceShare, year, &[NATIONAL])?
        .into_iter()
        .map(|(_, elec, ratio)| (to_primary_percent(elec, factor), ratio))
        .collect();
    Ok(Chart::Scatter(ScatterChart {
        title: Some(format!("Electrification and Prices by State in {}", year)),
        x_label: "Electrification".into(),
        y_label: "Electricity to Energy Price Ratio".into(),
        points,
        percent_x: true,
    }))
}

/// Raw electrification against another per-state table.
pub fn electrification_scatter(store: &Store, year: i32, other: Table, y_label: &str) -> Result<Chart, PlotError> {
    let points = store
        .joined_for_year(Table::Electrification, other, year, &[NATIONAL])?
        .into_iter()
        .map(|(_, elec, value)| (elec, value))
        .collect();
    Ok(Chart::Scatter(ScatterChart {
        title: None,
        x_label: "Electrification".into(),
        y_label: y_label.into(),
        points,
        percent_x: false,
    }))
}

/// Label position for each sector line, in (year, percent).
fn sector_label_position(sector: Sector) -> (f64, f64) {
    match sector {
        Sector::Commercial => (1983.0, 55.0),
        Sector::Residential => (1990.0, 43.0),
        Sector::Industrial => (1990.0, 22.0),
        Sector::Transportation => (1990.0, 1.5),
    }
}

/// National overall and per-sector electrification with inline labels.
pub fn sector_electrification(store: &Store, factor: f64) -> Result<Chart, PlotError> {
    let percent = |v| to_primary_percent(v, factor);
    let mut series = Vec::new();
    let mut annotations = Vec::new();

    for sector in Sector::ALL {
        series.push(national_line(store, sector.electrification_table(), sector.label(), percent)?);
        let (x, y) = sector_label_position(sector);
        annotations.push(Annotation { x, y, text: sector.label().into() });
    }
    series.push(LineSeriesSpec {
        width: 2,
        ..national_line(store, Table::Electrification, "Overall", percent)?
    });
    annotations.push(Annotation { x: 1990.0, y: 29.0, text: "Overall".into() });

    // Labels only make sense next to lines
    if series.iter().all(|s| s.points.is_empty()) {
        annotations.clear();
    }

    Ok(Chart::Line(LineChart {
        title: None,
        x_label: String::new(),
        y_label: "Electrification".into(),
        series,
        y_range: None,
        percent_axis: true,
        annotations,
    }))
}
