//! Store Coverage Verification Module
//!
//! Checks every catalog table in a built store for missing states and for
//! gaps in the national series, so a partial ingestion is visible before
//! the analyses run. The report serializes to JSON.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::analysis::missing_years;
use crate::catalog::{Table, NATIONAL, STATE_REGISTRY};
use crate::config::Config;
use crate::db::Store;
use crate::logging::{self, Stage};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub tables: Vec<TableCoverage>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub tables_total: usize,
    pub tables_complete: usize,
    pub tables_partial: usize,
    pub tables_empty: usize,
    /// Schema tables that no stage writes; never counted as empty.
    pub tables_not_produced: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TableKind {
    Primary,
    Derived,
    NotProduced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCoverage {
    pub table: String,
    pub kind: TableKind,
    pub rows: usize,
    pub states: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub missing_states: Vec<String>,
    /// Years in the configured range with no national row.
    pub national_gaps: Vec<i32>,
    pub status: VerificationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
    NotProduced,
}

// ============================================================================
// Table Verification
// ============================================================================

/// Coverage of one table against `expected_states` over `first..end`.
pub fn verify_table(
    store: &Store,
    table: Table,
    expected_states: &[&str],
    first: i32,
    end: i32,
) -> rusqlite::Result<TableCoverage> {
    let rows = store.rows(table)?;
    let present: BTreeSet<&str> = rows.iter().map(|o| o.state.as_str()).collect();

    let missing_states: Vec<String> = expected_states
        .iter()
        .filter(|s| !present.contains(*s))
        .map(|s| s.to_string())
        .collect();

    let national_gaps = if rows.is_empty() || end <= first {
        Vec::new()
    } else {
        let years = store.years_for_state(table, NATIONAL)?;
        missing_years(&years, first, end - 1)
    };

    let kind = if table.is_derived() {
        TableKind::Derived
    } else if table.is_produced() {
        TableKind::Primary
    } else {
        TableKind::NotProduced
    };

    let status = if kind == TableKind::NotProduced && rows.is_empty() {
        VerificationStatus::NotProduced
    } else if rows.is_empty() {
        VerificationStatus::Failed
    } else if missing_states.is_empty() && national_gaps.is_empty() {
        VerificationStatus::Success
    } else {
        VerificationStatus::PartialSuccess
    };

    Ok(TableCoverage {
        table: table.name().to_string(),
        kind,
        rows: rows.len(),
        states: present.len(),
        first_year: rows.iter().map(|o| o.year).min(),
        last_year: rows.iter().map(|o| o.year).max(),
        missing_states,
        national_gaps,
        status,
    })
}

/// Verify every catalog table against the registry and the configured years.
pub fn verify_store(store: &Store, config: &Config) -> rusqlite::Result<VerificationReport> {
    let expected: Vec<&str> = STATE_REGISTRY.iter().map(|s| s.name).collect();

    let mut report = VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        tables: Vec::with_capacity(Table::ALL.len()),
        summary: VerificationSummary {
            tables_total: Table::ALL.len(),
            ..VerificationSummary::default()
        },
    };

    println!("\nVerifying store tables...");
    for table in Table::ALL {
        let coverage = verify_table(store, table, &expected, config.first_year, config.end_year)?;
        print!("  {:<32} ", coverage.table);

        match coverage.status {
            VerificationStatus::Success => {
                println!("✓ OK ({} rows, {} states)", coverage.rows, coverage.states);
                report.summary.tables_complete += 1;
            }
            VerificationStatus::PartialSuccess => {
                println!(
                    "⚠ Partial ({} states missing, {} national gaps)",
                    coverage.missing_states.len(),
                    coverage.national_gaps.len()
                );
                logging::debug(
                    Stage::Store,
                    Some(&coverage.table),
                    &format!("missing states {:?}, national gaps {:?}", coverage.missing_states, coverage.national_gaps),
                );
                report.summary.tables_partial += 1;
            }
            VerificationStatus::Failed => {
                println!("✗ EMPTY");
                report.summary.tables_empty += 1;
            }
            VerificationStatus::NotProduced => {
                println!("- not produced");
                report.summary.tables_not_produced += 1;
            }
        }

        report.tables.push(coverage);
    }

    Ok(report)
}

pub fn print_summary(report: &VerificationReport) {
    let rule = "═".repeat(60);
    println!("\n{}", rule);
    println!("STORE VERIFICATION SUMMARY");
    println!("{}", rule);
    println!();
    let produced = report.summary.tables_total - report.summary.tables_not_produced;
    println!(
        "Tables:  {}/{} complete  ({} partial, {} empty, {} not produced)",
        report.summary.tables_complete,
        produced,
        report.summary.tables_partial,
        report.summary.tables_empty,
        report.summary.tables_not_produced
    );

    let usable = report.summary.tables_complete + report.summary.tables_partial;
    let rate = if produced > 0 {
        (usable as f64 / produced as f64) * 100.0
    } else {
        0.0
    };
    println!("Tables with data: {:.1}% ({}/{})", rate, usable, produced);
    println!("{}", rule);
}
