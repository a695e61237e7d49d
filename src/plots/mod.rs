/// Reporting stage: fixed charts built from the store.
///
/// Each chart is first built as a plain data model (`Chart`), which is what
/// the tests inspect, then rendered with `plotters` to SVG or PNG according
/// to the file extension.
///
/// Submodules:
/// - `charts` — the chart builders (query plus fixed transform).
/// - `render` — drawing a `Chart` to a file.

pub mod charts;
pub mod render;

use std::fmt;
use std::path::PathBuf;

use crate::config::Config;
use crate::db::Store;
use crate::logging::{self, Stage};

/// Chart size in pixels (7 × 4 inches at 100 dpi).
pub const WIDTH: u32 = 700;
pub const HEIGHT: u32 = 400;

/// `#333333`, the default stroke for every series
pub const GREY: Rgb = Rgb(0x33, 0x33, 0x33);
pub const BLACK: Rgb = Rgb(0, 0, 0);

/// Convert an electrification ratio to a percentage of primary energy.
pub fn to_primary_percent(value: f64, factor: f64) -> f64 {
    100.0 * factor * value
}

// ---------------------------------------------------------------------------
// Chart models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, PartialEq)]
pub struct LineSeriesSpec {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub width: u32,
    pub alpha: f64,
    pub color: Rgb,
}

impl LineSeriesSpec {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
            width: 1,
            alpha: 1.0,
            color: GREY,
        }
    }
}

/// Free text placed at data coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<LineSeriesSpec>,
    /// Fixed y axis; derived from the data when `None`.
    pub y_range: Option<(f64, f64)>,
    /// Format y tick labels as percentages.
    pub percent_axis: bool,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
    /// Format x tick labels as percentages.
    pub percent_x: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Line(LineChart),
    Scatter(ScatterChart),
}

impl Chart {
    pub fn is_empty(&self) -> bool {
        match self {
            Chart::Line(line) => line.series.iter().all(|s| s.points.is_empty()),
            Chart::Scatter(scatter) => scatter.points.is_empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum PlotError {
    Store(rusqlite::Error),
    /// File name has no `.svg` or `.png` extension
    UnsupportedFormat(String),
    Render(String),
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotError::Store(e) => write!(f, "Store error: {}", e),
            PlotError::UnsupportedFormat(name) => write!(f, "Unsupported chart format: {}", name),
            PlotError::Render(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for PlotError {}

impl From<rusqlite::Error> for PlotError {
    fn from(err: rusqlite::Error) -> Self {
        PlotError::Store(err)
    }
}

// ---------------------------------------------------------------------------
// Batch generation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ChartStatus {
    Written(PathBuf),
    /// Query returned no rows; nothing was drawn
    SkippedEmpty,
    Failed(PlotError),
}

#[derive(Debug)]
pub struct ChartOutcome {
    pub file_name: &'static str,
    pub status: ChartStatus,
}

impl ChartOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ChartStatus::Failed(_))
    }
}

/// Build and write every chart into `config.output_dir`. A chart that fails
/// is logged and recorded; the others are still produced.
pub fn generate_all(store: &Store, config: &Config) -> Vec<ChartOutcome> {
    let mut outcomes = Vec::with_capacity(charts::CHARTS.len());

    for job in charts::CHARTS {
        let status = match (job.build)(store, config) {
            Ok(chart) if chart.is_empty() => {
                logging::warn(Stage::Plot, Some(job.file_name), "no data, chart skipped");
                ChartStatus::SkippedEmpty
            }
            Ok(chart) => {
                let path = config.output_path(job.file_name);
                match render::render_to_file(&chart, &path) {
                    Ok(()) => {
                        logging::info(Stage::Plot, Some(job.file_name), &format!("wrote {}", path.display()));
                        ChartStatus::Written(path)
                    }
                    Err(err) => {
                        logging::error(Stage::Plot, Some(job.file_name), &err.to_string());
                        ChartStatus::Failed(err)
                    }
                }
            }
            Err(err) => {
                logging::error(Stage::Plot, Some(job.file_name), &err.to_string());
                ChartStatus::Failed(err)
            }
        };
        outcomes.push(ChartOutcome {
            file_name: job.file_name,
            status,
        });
    }

    outcomes
}
