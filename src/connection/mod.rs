//! SQL connection abstraction
//!
//! Historians are reached through ODBC-style drivers that accept text SQL
//! and return tabular results. This module defines the minimal seam the
//! rest of the crate depends on:
//! - `SqlDriver`: opens a connection from a connection string
//! - `SqlConnection`: executes one statement at a time, blocking
//! - `ResultSet` / `SqlValue`: the materialized table a statement returns
//!
//! A reference implementation backed by SQLite lives in
//! [`sqlite`](crate::connection::sqlite). Production drivers wrap vendor
//! ODBC bridges and live outside this crate.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

pub mod sqlite;

pub use sqlite::{SqliteConnection, SqliteDriver};

/// Errors from the SQL connection layer
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Could not open the connection
    #[error("Connect failed: {0}")]
    Connect(String),

    /// Statement execution or row decoding failed
    #[error("Query failed: {0}")]
    Query(String),
}

/// A single cell value in a result set
///
/// Drivers differ in how they type columns (Aspen returns status codes as
/// text, PI returns booleans for quality flags), so the cell type covers
/// everything the dialects produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Text content, if this cell is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, coercing from the representations drivers use
    /// for numeric codes (integer, float with no fraction, numeric text)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(n) => Some(*n),
            SqlValue::Real(f) if f.fract() == 0.0 => Some(*f as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Float content, coercing from integer and numeric text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Real(f) => Some(*f),
            SqlValue::Integer(n) => Some(*n as f64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => write!(f, ""),
            SqlValue::Integer(n) => write!(f, "{}", n),
            SqlValue::Real(x) => write!(f, "{}", x),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Timestamp(ts) => write!(f, "{}", ts),
        }
    }
}

/// A fully materialized query result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    /// Column names as reported by the driver
    pub columns: Vec<String>,
    /// Row-major cell values; every row has `columns.len()` cells
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    /// Create an empty result set with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a result set from columns and rows
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a column by name, ignoring case (drivers disagree on casing)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Cell at (row, column name), if both exist
    pub fn value(&self, row: usize, column: &str) -> Option<&SqlValue> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }
}

/// A blocking SQL connection to a historian or compatible database
pub trait SqlConnection {
    /// Execute one statement and materialize its result.
    ///
    /// Statements that return no rows (DDL, inserts) yield an empty
    /// result set with no columns.
    fn execute(&mut self, sql: &str) -> Result<ResultSet, ConnectionError>;
}

/// Opens connections from backend-specific connection strings
pub trait SqlDriver {
    type Connection: SqlConnection;

    fn connect(&self, connection_string: &str) -> Result<Self::Connection, ConnectionError>;
}
