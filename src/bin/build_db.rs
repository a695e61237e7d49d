//! Build `eia.db`: fetch every SEDS series for every state, then compute the
//! derived tables. Exits non-zero if any series failed to load.

use std::error::Error;
use std::process::ExitCode;

use electrification::config::{self, Config};
use electrification::db::Store;
use electrification::ingest::eia::EiaClient;
use electrification::ingest::run_ingestion;
use electrification::logging::{self, Stage};

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let config = Config::load_or_default()?;
    logging::init_from_config(&config);

    let api_key = config::api_key()?;
    let client = EiaClient::new(&config, api_key)?;
    let mut store = Store::open(&config.db_path)?;

    logging::info(
        Stage::System,
        None,
        &format!(
            "Building {} for {}–{}",
            config.db_path.display(),
            config.first_year,
            config.end_year - 1
        ),
    );

    let report = run_ingestion(&mut store, &client, &config)?;
    report.print_summary();

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
