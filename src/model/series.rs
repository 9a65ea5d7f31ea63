//! Canonical normalized time series
//!
//! Both dialects normalize into this shape: a UTC index, one value
//! column named exactly as the requested tag string (mapping selector
//! included), and an optional integer status column named
//! `<tag>::status`. An empty series is a valid result, not an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::connection::SqlValue;

/// One normalized tag read
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CanonicalSeries {
    /// Value column name: the tag exactly as requested
    pub name: String,
    /// UTC timestamps, in backend order
    pub timestamps: Vec<DateTime<Utc>>,
    /// One value per timestamp; digital points may hold display text
    pub values: Vec<SqlValue>,
    /// Status codes per timestamp, when the request asked for them
    pub status: Option<Vec<i64>>,
}

impl CanonicalSeries {
    /// Create a series
    ///
    /// # Panics
    /// Panics if column lengths disagree
    pub fn new(
        name: impl Into<String>,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<SqlValue>,
        status: Option<Vec<i64>>,
    ) -> Self {
        assert_eq!(
            timestamps.len(),
            values.len(),
            "CanonicalSeries: value count must match timestamp count"
        );
        if let Some(status) = &status {
            assert_eq!(
                timestamps.len(),
                status.len(),
                "CanonicalSeries: status count must match timestamp count"
            );
        }
        Self {
            name: name.into(),
            timestamps,
            values,
            status,
        }
    }

    /// Create an empty series carrying only the column name
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamps: Vec::new(),
            values: Vec::new(),
            status: None,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Name of the status column
    pub fn status_name(&self) -> String {
        format!("{}::status", self.name)
    }

    /// Iterate rows as (timestamp, value, status)
    pub fn rows(&self) -> impl Iterator<Item = (DateTime<Utc>, &SqlValue, Option<i64>)> + '_ {
        self.timestamps
            .iter()
            .zip(self.values.iter())
            .enumerate()
            .map(move |(idx, (ts, value))| {
                let status = self.status.as_ref().map(|s| s[idx]);
                (*ts, value, status)
            })
    }

    /// Write the series as CSV with a header row.
    ///
    /// Timestamps are ISO 8601 UTC; null values become empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut out = csv::Writer::from_writer(writer);

        match &self.status {
            Some(_) => out.write_record(["time", &self.name, &self.status_name()])?,
            None => out.write_record(["time", &self.name])?,
        }

        for (ts, value, status) in self.rows() {
            let ts = ts.format("%Y-%m-%dT%H:%M:%S%.fZ").to_string();
            match status {
                Some(code) => out.write_record([ts, value.to_string(), code.to_string()])?,
                None => out.write_record([ts, value.to_string()])?,
            }
        }

        out.flush()?;
        Ok(())
    }
}
