/// EIA (U.S. Energy Information Administration) Series API Client
///
/// Retrieves annual State Energy Data System (SEDS) series, one request per
/// (state, series) pair. Series ids follow the SEDS convention
/// `SEDS.<MSN>.<state code>.A`, e.g. `SEDS.TETCB.OH.A` for total energy
/// consumption in Ohio.
///
/// API Documentation: https://www.eia.gov/opendata/
///
/// The only part of the response consumed is the first entry of `series`
/// and its `data` array of `[year, value]` pairs.

use serde::Deserialize;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::logging::{self, Stage};
use crate::model::{EiaError, Observation};

// ============================================================================
// EIA API Response Structures
// ============================================================================

/// Series response from the EIA API
#[derive(Debug, Deserialize)]
pub struct EiaSeriesResponse {
    #[serde(default)]
    pub series: Vec<EiaSeries>,
}

/// One series entry; only `data` is read, other fields are ignored
#[derive(Debug, Deserialize)]
pub struct EiaSeries {
    /// `[year-string, value]` pairs, most recent year first
    #[serde(default)]
    pub data: Vec<(serde_json::Value, serde_json::Value)>,
}

// ============================================================================
// URL Construction
// ============================================================================

/// SEDS annual series id for one state
pub fn build_series_id(msn: &str, state_code: &str) -> String {
    format!("SEDS.{}.{}.A", msn, state_code)
}

pub fn build_series_url(base_url: &str, api_key: &str, series_id: &str) -> String {
    format!("{}?api_key={}&series_id={}", base_url, api_key, series_id)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a series response body into observations for `state`.
///
/// Years must be integers (as strings or numbers). Values may be JSON
/// numbers or numeric strings; SEDS marks withheld or unavailable values
/// with `null`, `"NA"` or `"--"`, and those entries are skipped.
pub fn parse_series_response(
    body: &str,
    series_id: &str,
    state: &str,
) -> Result<Vec<Observation>, EiaError> {
    let response: EiaSeriesResponse =
        serde_json::from_str(body).map_err(|e| EiaError::ParseError(e.to_string()))?;

    let series = response
        .series
        .into_iter()
        .next()
        .ok_or_else(|| EiaError::SeriesNotFound(series_id.to_string()))?;

    let mut observations = Vec::with_capacity(series.data.len());
    for (year, value) in &series.data {
        let year = parse_year(year).ok_or_else(|| {
            EiaError::InvalidData(format!("invalid year {} in {}", year, series_id))
        })?;
        if let Some(value) = parse_value(value) {
            observations.push(Observation::new(state, year, value));
        }
    }

    if observations.is_empty() {
        return Err(EiaError::NoDataAvailable(series_id.to_string()));
    }

    Ok(observations)
}

fn parse_year(raw: &serde_json::Value) -> Option<i32> {
    match raw {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        _ => None,
    }
}

fn parse_value(raw: &serde_json::Value) -> Option<f64> {
    let value = match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// Keep observations with `first <= year < end`.
pub fn filter_years(observations: Vec<Observation>, first: i32, end: i32) -> Vec<Observation> {
    observations
        .into_iter()
        .filter(|obs| obs.year >= first && obs.year < end)
        .collect()
}

// ============================================================================
// API Client
// ============================================================================

/// Source of primary series. Implemented by `EiaClient`; tests substitute
/// canned data.
pub trait SeriesFetcher {
    /// Fetch every available year of `msn` for one state.
    fn fetch_series(&self, msn: &str, state_name: &str, state_code: &str)
        -> Result<Vec<Observation>, EiaError>;
}

/// Retry settings for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): doubles each time
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Call `op` until it succeeds, fails permanently, or `max_attempts`
    /// calls have been made. `subject` tags the retry warnings.
    pub fn run<T>(
        &self,
        subject: &str,
        mut op: impl FnMut() -> Result<T, EiaError>,
    ) -> Result<T, EiaError> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    logging::warn(
                        Stage::Eia,
                        Some(subject),
                        &format!(
                            "attempt {}/{} failed ({}), retrying in {} ms",
                            attempt,
                            self.max_attempts,
                            err,
                            delay.as_millis()
                        ),
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

pub struct EiaClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl EiaClient {
    pub fn new(config: &Config, api_key: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            api_key,
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            },
        })
    }

    /// One GET, no retry
    fn fetch_once(&self, series_id: &str, state_name: &str) -> Result<Vec<Observation>, EiaError> {
        let url = build_series_url(&self.base_url, &self.api_key, series_id);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| EiaError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EiaError::HttpError(response.status().as_u16()));
        }

        let body = response.text().map_err(|e| EiaError::Network(e.to_string()))?;
        parse_series_response(&body, series_id, state_name)
    }
}

impl SeriesFetcher for EiaClient {
    fn fetch_series(
        &self,
        msn: &str,
        state_name: &str,
        state_code: &str,
    ) -> Result<Vec<Observation>, EiaError> {
        let series_id = build_series_id(msn, state_code);
        self.retry.run(&series_id, || self.fetch_once(&series_id, state_name))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "request": {"command": "series", "series_id": "SEDS.TETCB.OH.A"},
        "series": [{
            "series_id": "SEDS.TETCB.OH.A",
            "name": "Total energy consumption, Ohio",
            "units": "Billion Btu",
            "f": "A",
            "data": [["2019", 3692156], ["2018", "3730052.5"], ["2017", null], ["2016", "NA"]]
        }]
    }"#;

    #[test]
    fn test_series_id_format() {
        assert_eq!(build_series_id("TETCB", "OH"), "SEDS.TETCB.OH.A");
        assert_eq!(build_series_id("ESTCD", "US"), "SEDS.ESTCD.US.A");
    }

    #[test]
    fn test_url_contains_key_and_series() {
        let url = build_series_url("http://api.eia.gov/series/", "KEY", "SEDS.TETCB.OH.A");
        assert_eq!(url, "http://api.eia.gov/series/?api_key=KEY&series_id=SEDS.TETCB.OH.A");
    }

    #[test]
    fn test_parse_skips_unavailable_values() {
        let obs = parse_series_response(SAMPLE, "SEDS.TETCB.OH.A", "Ohio").expect("valid body");
        assert_eq!(
            obs,
            vec![
                Observation::new("Ohio", 2019, 3692156.0),
                Observation::new("Ohio", 2018, 3730052.5),
            ]
        );
    }

    #[test]
    fn test_parse_missing_series_is_not_found() {
        let result = parse_series_response(r#"{"series": []}"#, "SEDS.XXXXX.OH.A", "Ohio");
        assert_eq!(result, Err(EiaError::SeriesNotFound("SEDS.XXXXX.OH.A".into())));

        // The API reports unknown ids as an error object with no series at all
        let result = parse_series_response(
            r#"{"request": {}, "data": {"error": "invalid series_id"}}"#,
            "SEDS.XXXXX.OH.A",
            "Ohio",
        );
        assert!(matches!(result, Err(EiaError::SeriesNotFound(_))));
    }

    #[test]
    fn test_parse_all_null_values_is_no_data() {
        let body = r#"{"series": [{"data": [["2019", null], ["2018", "--"]]}]}"#;
        let result = parse_series_response(body, "SEDS.ESACB.VT.A", "Vermont");
        assert_eq!(result, Err(EiaError::NoDataAvailable("SEDS.ESACB.VT.A".into())));
    }

    #[test]
    fn test_parse_malformed_json_is_transient() {
        let result = parse_series_response(r#"{"series": [{"data": [["2019""#, "id", "Ohio");
        match result {
            Err(err @ EiaError::ParseError(_)) => assert!(err.is_transient()),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bad_year_is_permanent() {
        let body = r#"{"series": [{"data": [["twenty", 1.0]]}]}"#;
        match parse_series_response(body, "id", "Ohio") {
            Err(err @ EiaError::InvalidData(_)) => assert!(!err.is_transient()),
            other => panic!("expected invalid data, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_years_is_half_open() {
        let obs = vec![
            Observation::new("Ohio", 1959, 1.0),
            Observation::new("Ohio", 1960, 2.0),
            Observation::new("Ohio", 2020, 3.0),
            Observation::new("Ohio", 2021, 4.0),
        ];
        let kept: Vec<i32> = filter_years(obs, 1960, 2021).iter().map(|o| o.year).collect();
        assert_eq!(kept, vec![1960, 2020]);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    fn immediate(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::ZERO,
        }
    }

    #[test]
    fn test_transient_errors_are_retried_until_success() {
        let mut calls = 0;
        let result = immediate(3).run("SEDS.TETCB.OH.A", || {
            calls += 1;
            if calls < 3 { Err(EiaError::HttpError(503)) } else { Ok(calls) }
        });
        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retries_stop_at_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = immediate(3).run("SEDS.TETCB.OH.A", || {
            calls += 1;
            Err(EiaError::Network("timed out".into()))
        });
        assert_eq!(result, Err(EiaError::Network("timed out".into())));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_permanent_errors_return_immediately() {
        let mut calls = 0;
        let result: Result<(), _> = immediate(5).run("SEDS.TETCB.OH.A", || {
            calls += 1;
            Err(EiaError::InvalidData("invalid year \"twenty\"".into()))
        });
        assert!(matches!(result, Err(EiaError::InvalidData(_))));
        assert_eq!(calls, 1);

        calls = 0;
        let result: Result<(), _> = immediate(5).run("SEDS.TETCB.OH.A", || {
            calls += 1;
            Err(EiaError::HttpError(404))
        });
        assert_eq!(result, Err(EiaError::HttpError(404)));
        assert_eq!(calls, 1);
    }
}
