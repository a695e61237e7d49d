//! Run the regressions, Granger test and variance decompositions against an
//! existing store and print the results.

use std::error::Error;
use std::process::ExitCode;

use electrification::analysis::run_all;
use electrification::config::Config;
use electrification::db::Store;
use electrification::logging;

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let config = Config::load_or_default()?;
    logging::init_from_config(&config);

    let store = Store::open_read_only(&config.db_path)?;
    let run = run_all(&store, &config);

    if run.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        for (name, err) in &run.failed {
            eprintln!("{}: {}", name, err);
        }
        Ok(ExitCode::FAILURE)
    }
}
