//! US state electrification pipeline.
//!
//! Three stages share one SQLite store:
//! - `ingest` pulls SEDS series from the EIA API and derives quotient tables.
//! - `analysis` runs the regressions, Granger test and decompositions.
//! - `plots` renders the report charts.
//!
//! `verify` reports table coverage of a built store.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod plots;
pub mod verify;
