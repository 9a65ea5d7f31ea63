//! SQLite-backed reference driver
//!
//! Implements the connection traits over an embedded SQLite database.
//! Used by integration tests and by callers that keep historian extracts
//! in local SQLite files. Vendor ODBC bridges implement the same traits
//! outside this crate.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use super::{ConnectionError, ResultSet, SqlConnection, SqlDriver, SqlValue};

/// Driver that opens SQLite files (or `:memory:`) as SQL connections
pub struct SqliteDriver;

impl SqlDriver for SqliteDriver {
    type Connection = SqliteConnection;

    fn connect(&self, connection_string: &str) -> Result<SqliteConnection, ConnectionError> {
        if connection_string == ":memory:" {
            SqliteConnection::open_in_memory()
        } else {
            SqliteConnection::open(Path::new(connection_string))
        }
    }
}

/// A blocking connection to a SQLite database
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// Open or create a database file
    pub fn open(path: &Path) -> Result<Self, ConnectionError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ConnectionError::Connect(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, ConnectionError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ConnectionError::Connect(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run several statements at once (schema setup, pragmas)
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), ConnectionError> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| ConnectionError::Query(e.to_string()))
    }
}

impl SqlConnection for SqliteConnection {
    fn execute(&mut self, sql: &str) -> Result<ResultSet, ConnectionError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| ConnectionError::Query(e.to_string()))?;

        // Statements without result columns (DDL, DML) run directly
        if stmt.column_count() == 0 {
            stmt.execute([])
                .map_err(|e| ConnectionError::Query(e.to_string()))?;
            return Ok(ResultSet::new(Vec::new()));
        }

        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let column_count = columns.len();

        let mut out = Vec::new();
        let mut rows = stmt
            .query([])
            .map_err(|e| ConnectionError::Query(e.to_string()))?;

        while let Some(row) = rows
            .next()
            .map_err(|e| ConnectionError::Query(e.to_string()))?
        {
            let mut cells = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let value = match row
                    .get_ref(idx)
                    .map_err(|e| ConnectionError::Query(e.to_string()))?
                {
                    ValueRef::Null => SqlValue::Null,
                    ValueRef::Integer(n) => SqlValue::Integer(n),
                    ValueRef::Real(f) => SqlValue::Real(f),
                    ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
                    // Blobs never occur in historian results
                    ValueRef::Blob(_) => SqlValue::Null,
                };
                cells.push(value);
            }
            out.push(cells);
        }

        Ok(ResultSet::with_rows(columns, out))
    }
}
