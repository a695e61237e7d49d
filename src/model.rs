/// Core data types for the electrification pipeline.
///
/// This module defines the shared domain model imported by all other modules:
/// the row shapes read from and written to the store, and the error types of
/// the API boundary and the analysis stage. It contains no I/O.

use std::fmt;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One row of a series table: `(State, Year, Value)`.
///
/// Every table in the store has this shape, with `(State, Year)` unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub state: String,
    pub year: i32,
    pub value: f64,
}

impl Observation {
    pub fn new(state: &str, year: i32, value: f64) -> Self {
        Self {
            state: state.to_string(),
            year,
            value,
        }
    }
}

/// A single year of one state's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// A single state's value for a fixed year.
#[derive(Debug, Clone, PartialEq)]
pub struct StateValue {
    pub state: String,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// EIA API errors
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or parsing a SEDS series.
#[derive(Debug, Clone, PartialEq)]
pub enum EiaError {
    /// Non-2xx HTTP response from the EIA API.
    HttpError(u16),
    /// The request never produced a response (DNS, connect, timeout).
    Network(String),
    /// The response body could not be deserialized.
    ParseError(String),
    /// The body was well-formed JSON but a data row is unusable, e.g. a
    /// year that is not an integer.
    InvalidData(String),
    /// The response had no `series` entry for the requested id.
    SeriesNotFound(String),
    /// The series exists but its `data` array held no usable values.
    NoDataAvailable(String),
}

impl EiaError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Network failures, rate limiting, server errors and truncated or
    /// malformed bodies are transient; a 4xx, an unknown series id or a bad
    /// data row in a well-formed body is not.
    pub fn is_transient(&self) -> bool {
        match self {
            EiaError::Network(_) | EiaError::ParseError(_) => true,
            EiaError::HttpError(code) => *code == 429 || *code >= 500,
            EiaError::InvalidData(_) | EiaError::SeriesNotFound(_) | EiaError::NoDataAvailable(_) => false,
        }
    }
}

impl fmt::Display for EiaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EiaError::HttpError(code) => write!(f, "HTTP error: {}", code),
            EiaError::Network(msg) => write!(f, "Network error: {}", msg),
            EiaError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            EiaError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            EiaError::SeriesNotFound(id) => write!(f, "Series not found: {}", id),
            EiaError::NoDataAvailable(id) => write!(f, "No data available for series: {}", id),
        }
    }
}

impl std::error::Error for EiaError {}

// ---------------------------------------------------------------------------
// Analysis errors
// ---------------------------------------------------------------------------

/// Errors raised by the read-only analysis routines.
///
/// Integrity problems and statistical degeneracies are reported by name
/// instead of being allowed to propagate as NaN.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The underlying store query failed.
    Store(String),
    /// A row required by a join is absent.
    MissingData {
        table: String,
        state: String,
        year: Option<i32>,
    },
    /// A series that must cover a year range without gaps does not.
    NonContiguousYears {
        table: String,
        state: String,
        missing: Vec<i32>,
    },
    /// Too few observations for the requested computation.
    InsufficientData {
        routine: &'static str,
        needed: usize,
        available: usize,
    },
    /// Zero variance, a singular design matrix, or a zero denominator.
    Degenerate {
        routine: &'static str,
        reason: String,
    },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Store(msg) => write!(f, "Store error: {}", msg),
            AnalysisError::MissingData { table, state, year } => match year {
                Some(year) => write!(f, "Missing data: {} has no row for {} in {}", table, state, year),
                None => write!(f, "Missing data: {} has no rows for {}", table, state),
            },
            AnalysisError::NonContiguousYears { table, state, missing } => write!(
                f,
                "Non-contiguous years: {} for {} is missing {:?}",
                table, state, missing
            ),
            AnalysisError::InsufficientData { routine, needed, available } => write!(
                f,
                "Insufficient data for {}: need {} observations, have {}",
                routine, needed, available
            ),
            AnalysisError::Degenerate { routine, reason } => {
                write!(f, "Degenerate input to {}: {}", routine, reason)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<rusqlite::Error> for AnalysisError {
    fn from(err: rusqlite::Error) -> Self {
        AnalysisError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(EiaError::Network("timed out".into()).is_transient());
        assert!(EiaError::ParseError("EOF while parsing".into()).is_transient());
        assert!(EiaError::HttpError(429).is_transient());
        assert!(EiaError::HttpError(503).is_transient());
        assert!(!EiaError::HttpError(404).is_transient());
        assert!(!EiaError::SeriesNotFound("SEDS.TETCB.XX.A".into()).is_transient());
    }

    #[test]
    fn test_missing_data_message_names_table_state_and_year() {
        let err = AnalysisError::MissingData {
            table: "residential_share".into(),
            state: "Ohio".into(),
            year: Some(2019),
        };
        let msg = err.to_string();
        assert!(msg.contains("residential_share"));
        assert!(msg.contains("Ohio"));
        assert!(msg.contains("2019"));
    }
}
