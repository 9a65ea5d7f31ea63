//! # Historian
//!
//! Industrial Process Historian Client - A Rust library for querying
//! time-series process data from AspenTech IP.21 and OSIsoft PI
//! historians.
//!
//! ## Features
//!
//! - **Two dialects**: SQLplus for IP.21, PI SQL for the piarchive tables
//! - **One taxonomy**: raw, interpolated and aggregate reads share a single request type
//! - **Canonical output**: every read lands as a UTC series, whatever the backend returns
//! - **Metadata aware**: Aspen field mappings and PI digital sets resolved on the fly
//! - **Pluggable connections**: any bridge that can run a statement and hand back rows
//!
//! ## Modules
//!
//! - [`model`]: read requests, reader types, time ranges and the canonical series
//! - [`aspen`]: AspenTech IP.21 backend (SQLplus dialect)
//! - [`pi`]: OSIsoft PI backend (piarchive dialect)
//! - [`connection`]: connection abstraction and the SQLite reference driver
//! - [`session`]: backend-independent session trait and dispatch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use historian::connection::SqliteDriver;
//! use historian::{
//!     connect, Backend, ReadRequest, ReaderType, SampleInterval, SourceConfig, TimeRange,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // SQLite stands in for an ODBC bridge here
//!     let mut config = SourceConfig::new(Backend::Pi, "pihost.example.com");
//!     config.connection_string = Some("pi.db".to_string());
//!
//!     let mut session = connect(&SqliteDriver, &config)?;
//!
//!     // Tag search with wildcards
//!     for hit in session.search(Some("ATC*"), None)? {
//!         println!("{}: {}", hit.name, hit.description);
//!     }
//!
//!     // One-minute averages over the last 8 hours, with quality flags
//!     let request = ReadRequest::new("ATCAI", ReaderType::Avg, TimeRange::last_hours(8))
//!         .interval(SampleInterval::from_minutes(1))
//!         .with_status();
//!
//!     let series = session.read(&request)?;
//!     println!("{} rows for {}", series.len(), series.name);
//!
//!     Ok(())
//! }
//! ```

pub mod aspen;
pub mod config;
pub mod connection;
pub mod error;
pub mod model;
pub mod pi;
pub mod session;

// Re-export top-level types for convenience
pub use error::{HistorianError, Result};

pub use model::{
    Backend, CanonicalSeries, ReadRequest, ReaderType, SampleInterval, Tag, TimeRange,
};

pub use connection::{
    ConnectionError, ResultSet, SqlConnection, SqlDriver, SqlValue, SqliteConnection, SqliteDriver,
};

pub use session::{connect, Historian, TagMatch};

pub use aspen::AspenHistorian;
pub use pi::PiHistorian;

pub use config::{Config, ConfigError, SourceConfig};
