/// The relational store shared by the ingestion, analysis and reporting stages.
///
/// One SQLite file holds one table per series, each shaped
/// `(State VARCHAR(32) NOT NULL, Year int, Value FLOAT, UNIQUE (State, Year))`.
/// Table and column names are the interface between stages and must stay
/// exactly as created here.
///
/// A `Store` is opened once per stage and dropped when the stage ends. Every
/// statement that names a table takes a `catalog::Table`, so query text is
/// assembled only from the fixed allow-list; data values are always bound as
/// parameters.

use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;

use crate::catalog::{Table, QUOTIENT_CATALOG};
use crate::logging::{self, Stage};
use crate::model::{Observation, StateValue, YearValue};

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) a read-write store.
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    logging::error(
                        Stage::Store,
                        Some(&parent.display().to_string()),
                        &format!("Failed to create database directory: {}", e),
                    );
                    rusqlite::Error::InvalidPath(parent.to_path_buf())
                })?;
            }
        }
        let conn = Connection::open(path)?;
        logging::debug(Stage::Store, Some(&path.display().to_string()), "opened read-write");
        Ok(Self { conn })
    }

    /// Open an existing store for the read-only stages.
    /// Fails if the file does not exist.
    pub fn open_read_only(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        logging::debug(Stage::Store, Some(&path.display().to_string()), "opened read-only");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    // -----------------------------------------------------------------------
    // Schema
    // -----------------------------------------------------------------------

    pub fn create_table(&self, table: Table) -> rusqlite::Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {}( \
                State VARCHAR(32) NOT NULL, \
                Year int, \
                Value FLOAT, \
                UNIQUE (State, Year) \
            );",
            table.name()
        ))
    }

    /// Create every table in the catalog.
    pub fn create_tables(&self) -> rusqlite::Result<()> {
        for table in Table::ALL {
            self.create_table(table)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert rows, ignoring any `(State, Year)` already present.
    /// Returns the number of rows actually added.
    pub fn insert_observations(
        &mut self,
        table: Table,
        observations: &[Observation],
    ) -> rusqlite::Result<usize> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (State, Year, Value) VALUES (?1, ?2, ?3)",
            table.name()
        );
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for obs in observations {
                inserted += stmt.execute(params![obs.state, obs.year, obs.value])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Insert a zero for every year, for series that are zero by definition.
    pub fn insert_zero_series(
        &mut self,
        table: Table,
        state: &str,
        years: std::ops::Range<i32>,
    ) -> rusqlite::Result<usize> {
        let zeros: Vec<Observation> = years.map(|year| Observation::new(state, year, 0.0)).collect();
        self.insert_observations(table, &zeros)
    }

    /// Fill `table` with `numerator / denominator` joined on `(State, Year)`.
    ///
    /// Keys missing from either input produce no row, and neither does a zero
    /// or NULL denominator: the quotient is undefined there, not zero.
    /// Existing rows are kept. Returns the number of rows added.
    pub fn add_quotient(
        &self,
        numerator: Table,
        denominator: Table,
        table: Table,
    ) -> rusqlite::Result<usize> {
        let sql = format!(
            "INSERT OR IGNORE INTO {t} (State, Year, Value) \
             SELECT n.State, n.Year, n.Value / d.Value \
             FROM {n} n \
             JOIN {d} d ON n.State = d.State AND n.Year = d.Year \
             WHERE n.Value IS NOT NULL AND d.Value IS NOT NULL AND d.Value != 0",
            t = table.name(),
            n = numerator.name(),
            d = denominator.name(),
        );
        self.conn.execute(&sql, [])
    }

    /// Compute every derived table. Returns the total number of rows added.
    pub fn build_derived_tables(&self) -> rusqlite::Result<usize> {
        let mut total = 0;
        for q in QUOTIENT_CATALOG {
            let added = self.add_quotient(q.numerator, q.denominator, q.table)?;
            logging::debug(
                Stage::Store,
                Some(q.table.name()),
                &format!("{} = {} / {}: {} new rows", q.table, q.numerator, q.denominator, added),
            );
            total += added;
        }
        Ok(total)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// One state's series, ordered by year.
    pub fn series_for_state(&self, table: Table, state: &str) -> rusqlite::Result<Vec<YearValue>> {
        let sql = format!(
            "SELECT Year, Value FROM {} WHERE State = ?1 AND Value IS NOT NULL ORDER BY Year",
            table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![state], |row| {
            Ok(YearValue {
                year: row.get(0)?,
                value: row.get(1)?,
            })
        })?;
        rows.collect()
    }

    /// Every state's value for one year, ordered by state, minus `exclude`.
    pub fn values_for_year(
        &self,
        table: Table,
        year: i32,
        exclude: &[&str],
    ) -> rusqlite::Result<Vec<StateValue>> {
        let sql = format!(
            "SELECT State, Value FROM {} WHERE Year = ?1 AND Value IS NOT NULL ORDER BY State",
            table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![year], |row| {
            Ok(StateValue {
                state: row.get(0)?,
                value: row.get(1)?,
            })
        })?;
        let mut values = Vec::new();
        for row in rows {
            let row = row?;
            if !exclude.contains(&row.state.as_str()) {
                values.push(row);
            }
        }
        Ok(values)
    }

    /// `(State, a.Value, b.Value)` for one year, joined on `(State, Year)`,
    /// ordered by state, minus `exclude`.
    pub fn joined_for_year(
        &self,
        a: Table,
        b: Table,
        year: i32,
        exclude: &[&str],
    ) -> rusqlite::Result<Vec<(String, f64, f64)>> {
        let sql = format!(
            "SELECT a.State, a.Value, b.Value \
             FROM {a} a JOIN {b} b ON a.Year = b.Year AND a.State = b.State \
             WHERE a.Year = ?1 AND a.Value IS NOT NULL AND b.Value IS NOT NULL \
             ORDER BY a.State",
            a = a.name(),
            b = b.name(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![year], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        let mut joined = Vec::new();
        for row in rows {
            let row: (String, f64, f64) = row?;
            if !exclude.contains(&row.0.as_str()) {
                joined.push(row);
            }
        }
        Ok(joined)
    }

    /// `(Year, a.Value, b.Value)` for one state, joined on `(State, Year)`,
    /// ordered by year.
    pub fn joined_for_state(
        &self,
        a: Table,
        b: Table,
        state: &str,
    ) -> rusqlite::Result<Vec<(i32, f64, f64)>> {
        let sql = format!(
            "SELECT a.Year, a.Value, b.Value \
             FROM {a} a JOIN {b} b ON a.Year = b.Year AND a.State = b.State \
             WHERE a.State = ?1 AND a.Value IS NOT NULL AND b.Value IS NOT NULL \
             ORDER BY a.Year",
            a = a.name(),
            b = b.name(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![state], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        rows.collect()
    }

    /// A single cell, if present.
    pub fn value_at(&self, table: Table, state: &str, year: i32) -> rusqlite::Result<Option<f64>> {
        let sql = format!(
            "SELECT Value FROM {} WHERE State = ?1 AND Year = ?2 AND Value IS NOT NULL",
            table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![state, year])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Distinct states present in a table, sorted.
    pub fn distinct_states(&self, table: Table) -> rusqlite::Result<Vec<String>> {
        let sql = format!("SELECT DISTINCT State FROM {} ORDER BY State", table.name());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    /// Years present for one state, ascending.
    pub fn years_for_state(&self, table: Table, state: &str) -> rusqlite::Result<Vec<i32>> {
        let sql = format!(
            "SELECT Year FROM {} WHERE State = ?1 AND Value IS NOT NULL ORDER BY Year",
            table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![state], |row| row.get(0))?;
        rows.collect()
    }

    pub fn row_count(&self, table: Table) -> rusqlite::Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Full contents of a table ordered by `(State, Year)`.
    pub fn rows(&self, table: Table) -> rusqlite::Result<Vec<Observation>> {
        let sql = format!(
            "SELECT State, Year, Value FROM {} WHERE Value IS NOT NULL ORDER BY State, Year",
            table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(Observation {
                state: row.get(0)?,
                year: row.get(1)?,
                value: row.get(2)?,
            })
        })?;
        rows.collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_tables() -> Store {
        let store = Store::open_in_memory().expect("in-memory store");
        store.create_tables().expect("schema");
        store
    }

    fn obs(state: &str, year: i32, value: f64) -> Observation {
        Observation::new(state, year, value)
    }

    #[test]
    fn test_create_tables_is_idempotent() {
        let store = store_with_tables();
        store.create_tables().expect("second create should be a no-op");
        for table in Table::ALL {
            assert_eq!(store.row_count(table).unwrap(), 0, "{} should start empty", table);
        }
    }

    #[test]
    fn test_insert_ignores_duplicate_state_year() {
        let mut store = store_with_tables();
        let first = store
            .insert_observations(Table::Energy, &[obs("Ohio", 2019, 100.0)])
            .unwrap();
        let second = store
            .insert_observations(Table::Energy, &[obs("Ohio", 2019, 999.0), obs("Ohio", 2020, 90.0)])
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 1, "only the new year should be inserted");
        assert_eq!(
            store.value_at(Table::Energy, "Ohio", 2019).unwrap(),
            Some(100.0),
            "existing rows must not be overwritten"
        );
    }

    #[test]
    fn test_quotient_of_example_tables() {
        let mut store = store_with_tables();
        store
            .insert_observations(Table::Energy, &[obs("US", 2000, 100.0), obs("US", 2001, 110.0)])
            .unwrap();
        store
            .insert_observations(Table::Electricity, &[obs("US", 2000, 20.0), obs("US", 2001, 24.0)])
            .unwrap();
        store
            .add_quotient(Table::Electricity, Table::Energy, Table::Electrification)
            .unwrap();

        let rows = store.rows(Table::Electrification).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2000);
        assert!((rows[0].value - 0.20).abs() < 1e-12);
        assert_eq!(rows[1].year, 2001);
        assert!((rows[1].value - 24.0 / 110.0).abs() < 1e-12);
        assert!((rows[1].value - 0.2182).abs() < 1e-4);
    }

    #[test]
    fn test_quotient_skips_missing_and_zero_denominators() {
        let mut store = store_with_tables();
        store
            .insert_observations(
                Table::Electricity,
                &[obs("Maine", 2000, 5.0), obs("Maine", 2001, 6.0), obs("Maine", 2002, 7.0)],
            )
            .unwrap();
        store
            .insert_observations(Table::Energy, &[obs("Maine", 2000, 50.0), obs("Maine", 2002, 0.0)])
            .unwrap();
        let added = store
            .add_quotient(Table::Electricity, Table::Energy, Table::Electrification)
            .unwrap();
        assert_eq!(added, 1, "2001 has no denominator and 2002 divides by zero");
        assert_eq!(store.value_at(Table::Electrification, "Maine", 2001).unwrap(), None);
        assert_eq!(store.value_at(Table::Electrification, "Maine", 2002).unwrap(), None);
    }

    #[test]
    fn test_rerunning_derived_tables_changes_nothing() {
        let mut store = store_with_tables();
        store
            .insert_observations(Table::Energy, &[obs("Iowa", 2010, 40.0)])
            .unwrap();
        store
            .insert_observations(Table::ResidentialEnergy, &[obs("Iowa", 2010, 10.0)])
            .unwrap();
        let first = store.build_derived_tables().unwrap();
        let before = store.rows(Table::ResidentialShare).unwrap();
        let second = store.build_derived_tables().unwrap();
        assert!(first > 0);
        assert_eq!(second, 0);
        assert_eq!(store.rows(Table::ResidentialShare).unwrap(), before);
    }

    #[test]
    fn test_zero_series_covers_every_year() {
        let mut store = store_with_tables();
        let added = store
            .insert_zero_series(Table::ElectricElectricity, "Utah", 1960..1965)
            .unwrap();
        assert_eq!(added, 5);
        assert_eq!(
            store.years_for_state(Table::ElectricElectricity, "Utah").unwrap(),
            vec![1960, 1961, 1962, 1963, 1964]
        );
    }

    #[test]
    fn test_joined_for_year_excludes_states_and_unmatched_keys() {
        let mut store = store_with_tables();
        store
            .insert_observations(
                Table::Electrification,
                &[obs("Ohio", 2019, 0.2), obs("Texas", 2019, 0.15), obs("United States", 2019, 0.18)],
            )
            .unwrap();
        store
            .insert_observations(
                Table::GdpPerCapita,
                &[obs("Ohio", 2019, 50.0), obs("United States", 2019, 60.0)],
            )
            .unwrap();
        let rows = store
            .joined_for_year(Table::Electrification, Table::GdpPerCapita, 2019, &["United States"])
            .unwrap();
        assert_eq!(rows, vec![("Ohio".to_string(), 0.2, 50.0)]);
    }

    #[test]
    fn test_reads_on_empty_year_return_empty() {
        let store = store_with_tables();
        assert!(store.values_for_year(Table::Energy, 1850, &[]).unwrap().is_empty());
        assert!(store.series_for_state(Table::Energy, "Atlantis").unwrap().is_empty());
        assert!(store
            .joined_for_state(Table::Electrification, Table::ElectricityPriceShare, "Atlantis")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_read_only_open_fails_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Store::open_read_only(dir.path().join("missing.db"));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("eia.db");
        let store = Store::open(&path).expect("store should open");
        store.create_tables().unwrap();
        assert!(path.exists());
    }
}
