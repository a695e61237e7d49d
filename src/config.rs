/// Pipeline configuration.
///
/// Settings live in an optional TOML file (`electrification.toml` by
/// default, or the path in `ELECTRIFICATION_CONFIG`). Every field has a
/// default, so an absent file yields the standard 1960–2020 run. The EIA API
/// key is a secret and is only ever read from the environment (`EIA_API_KEY`,
/// optionally via a `.env` file).

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default location of the optional configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "electrification.toml";

/// Environment variable overriding `DEFAULT_CONFIG_PATH`.
pub const CONFIG_PATH_ENV: &str = "ELECTRIFICATION_CONFIG";

/// Environment variable holding the EIA API key.
pub const API_KEY_ENV: &str = "EIA_API_KEY";

/// Primary energy factor used to express delivered electricity as a share of
/// primary energy. Each unit of delivered electricity is assumed to take 2.5
/// units of primary energy to generate.
pub const PRIMARY_ENERGY_FACTOR: f64 = 2.5;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
    Invalid(String),
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "Failed to parse config {}: {}", path.display(), message)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
            ConfigError::MissingApiKey => write!(
                f,
                "{} is not set; request a key at https://www.eia.gov/opendata/",
                API_KEY_ENV
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// SQLite file shared by every stage.
    pub db_path: PathBuf,
    /// EIA series endpoint.
    pub api_base_url: String,
    /// First year ingested.
    pub first_year: i32,
    /// One past the last year ingested.
    pub end_year: i32,
    /// Year of the cross-sectional regressions, decomposition and scatter plots.
    pub analysis_year: i32,
    /// Start year of the energy-growth regression.
    pub baseline_year: i32,
    pub decomposition_first_year: i32,
    pub decomposition_last_year: i32,
    pub granger_max_lag: usize,
    /// Directory charts and reports are written to.
    pub output_dir: PathBuf,
    pub primary_energy_factor: f64,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub log_file: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("eia.db"),
            api_base_url: "http://api.eia.gov/series/".to_string(),
            first_year: 1960,
            end_year: 2021,
            analysis_year: 2019,
            baseline_year: 2009,
            decomposition_first_year: 1960,
            decomposition_last_year: 2019,
            granger_max_lag: 15,
            output_dir: PathBuf::from("."),
            primary_energy_factor: PRIMARY_ENERGY_FACTOR,
            request_timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 500,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. The file must exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load the configuration file if present, defaults otherwise.
    ///
    /// The path is taken from `ELECTRIFICATION_CONFIG` when set, and
    /// `electrification.toml` in the working directory otherwise.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        if path.exists() {
            Self::load(&path)
        } else {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_year >= self.end_year {
            return Err(ConfigError::Invalid(format!(
                "first_year ({}) must be before end_year ({})",
                self.first_year, self.end_year
            )));
        }
        if self.decomposition_first_year >= self.decomposition_last_year {
            return Err(ConfigError::Invalid(format!(
                "decomposition_first_year ({}) must be before decomposition_last_year ({})",
                self.decomposition_first_year, self.decomposition_last_year
            )));
        }
        if self.granger_max_lag == 0 {
            return Err(ConfigError::Invalid("granger_max_lag must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if !(self.primary_energy_factor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "primary_energy_factor must be positive, got {}",
                self.primary_energy_factor
            )));
        }
        Ok(())
    }

    /// Every year in the ingestion span.
    pub fn years(&self) -> std::ops::Range<i32> {
        self.first_year..self.end_year
    }

    /// Path of an output file inside `output_dir`.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

/// Read the EIA API key from the environment (loading `.env` first).
pub fn api_key() -> Result<String, ConfigError> {
    dotenv::dotenv().ok();
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ConfigError::MissingApiKey),
    }
}
