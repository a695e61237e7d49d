//! Render the report charts from an existing store into `output_dir`.

use std::error::Error;
use std::process::ExitCode;

use electrification::config::Config;
use electrification::db::Store;
use electrification::logging;
use electrification::plots::{generate_all, ChartStatus};

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let config = Config::load_or_default()?;
    logging::init_from_config(&config);

    let store = Store::open_read_only(&config.db_path)?;
    let outcomes = generate_all(&store, &config);

    for outcome in &outcomes {
        match &outcome.status {
            ChartStatus::Written(path) => println!("  ✓ {}", path.display()),
            ChartStatus::SkippedEmpty => println!("  ⚠ {} (no data)", outcome.file_name),
            ChartStatus::Failed(err) => println!("  ✗ {}: {}", outcome.file_name, err),
        }
    }

    Ok(if outcomes.iter().any(|o| o.is_failure()) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
