//! Result normalization for SQLplus reads
//!
//! The read query aliases its projection to `"time"`, `"value"` and
//! `"status"`, so normalization is uniform across history, aggregate
//! and snapshot reads: parse the ISO 8601 timestamps, cast the status
//! chars to integers and name the columns after the requested tag.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::connection::{ResultSet, SqlValue};
use crate::error::{HistorianError, Result};
use crate::model::CanonicalSeries;

/// Timestamps as produced by ISO8601(), fractional seconds optional
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Turn a read result into the canonical series named `name`.
///
/// Zero rows is a valid outcome and yields an empty series.
pub fn normalize(
    result: &ResultSet,
    name: &str,
    with_status: bool,
) -> Result<CanonicalSeries> {
    if result.is_empty() {
        let mut series = CanonicalSeries::empty(name);
        if with_status {
            series.status = Some(Vec::new());
        }
        return Ok(series);
    }

    let time_col = column(result, "time")?;
    let value_col = column(result, "value")?;
    let status_col = if with_status {
        Some(column(result, "status")?)
    } else {
        None
    };

    let mut timestamps = Vec::with_capacity(result.len());
    let mut values = Vec::with_capacity(result.len());
    let mut status = status_col.map(|_| Vec::with_capacity(result.len()));

    for row in &result.rows {
        timestamps.push(parse_time(&row[time_col])?);
        values.push(row[value_col].clone());
        if let (Some(status), Some(col)) = (status.as_mut(), status_col) {
            status.push(parse_status(&row[col])?);
        }
    }

    Ok(CanonicalSeries::new(name, timestamps, values, status))
}

fn column(result: &ResultSet, name: &str) -> Result<usize> {
    result
        .column_index(name)
        .ok_or_else(|| HistorianError::MalformedResult(format!("missing {} column", name)))
}

fn parse_time(value: &SqlValue) -> Result<DateTime<Utc>> {
    match value {
        SqlValue::Text(text) => NaiveDateTime::parse_from_str(text, TIME_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|e| {
                HistorianError::MalformedResult(format!("bad timestamp {:?}: {}", text, e))
            }),
        SqlValue::Timestamp(naive) => Ok(naive.and_utc()),
        other => Err(HistorianError::MalformedResult(format!(
            "bad timestamp cell: {:?}",
            other
        ))),
    }
}

// The driver returns status as char; anything that does not read as an
// integer is a decode failure, not a value.
fn parse_status(value: &SqlValue) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| HistorianError::MalformedResult(format!("bad status cell: {:?}", value)))
}
