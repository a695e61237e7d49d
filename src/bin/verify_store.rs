//! Report table coverage of an existing store and save it as
//! `verification_report.json` in `output_dir`.

use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::process::ExitCode;

use electrification::config::Config;
use electrification::db::Store;
use electrification::logging;
use electrification::verify::{print_summary, verify_store};

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let config = Config::load_or_default()?;
    logging::init_from_config(&config);

    let store = Store::open_read_only(&config.db_path)?;
    let report = verify_store(&store, &config)?;
    print_summary(&report);

    let path = config.output_path("verification_report.json");
    let json = serde_json::to_string_pretty(&report)?;
    let mut file = File::create(&path)?;
    file.write_all(json.as_bytes())?;
    println!("\nReport saved to: {}", path.display());

    Ok(if report.summary.tables_empty == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
