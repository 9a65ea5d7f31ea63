//! PI point metadata
//!
//! The point table carries the digital set name, engineering units and
//! the point description. Digital points additionally need the state
//! table to map archived codes back to state names.

use crate::connection::{ResultSet, SqlConnection, SqlValue};
use crate::error::{HistorianError, Result};
use crate::pi::query;

/// Metadata for a single PI point
#[derive(Debug, Clone, PartialEq)]
pub struct PointMetadata {
    /// Digital set name, when the point is digital
    pub digital_set: Option<String>,
    /// Engineering units
    pub unit: String,
    /// Point description
    pub description: String,
}

/// States of a digital set, keyed by archive code
#[derive(Debug, Clone, PartialEq)]
pub struct DigitalSet {
    pub name: String,
    pub states: Vec<(i64, SqlValue)>,
}

impl DigitalSet {
    /// Resolve an archived value to its state name, when the value
    /// matches one of the set's codes.
    pub fn translate(&self, value: &SqlValue) -> Option<&SqlValue> {
        let code = value.as_i64()?;
        self.states
            .iter()
            .find(|(state_code, _)| *state_code == code)
            .map(|(_, offset)| offset)
    }
}

fn text(result: &ResultSet, row: usize, column: &str) -> Option<String> {
    match result.value(row, column) {
        Some(SqlValue::Text(s)) => Some(s.clone()),
        Some(value) if !value.is_null() => Some(value.to_string()),
        _ => None,
    }
}

/// Fetch point metadata, or None when the tag is not in the point table.
pub fn point_metadata<C: SqlConnection>(conn: &mut C, tag: &str) -> Result<Option<PointMetadata>> {
    let result = conn.execute(&query::point_query(tag))?;
    if result.is_empty() {
        return Ok(None);
    }

    let digital_set = text(&result, 0, "digitalset").filter(|name| !name.is_empty());
    let unit = text(&result, 0, "engunits").unwrap_or_default();
    let description = text(&result, 0, "descriptor").unwrap_or_default();

    Ok(Some(PointMetadata {
        digital_set,
        unit,
        description,
    }))
}

/// Fetch the states of a digital set.
pub fn digital_set<C: SqlConnection>(conn: &mut C, name: &str) -> Result<DigitalSet> {
    let result = conn.execute(&query::digital_set_query(name))?;
    let mut states = Vec::with_capacity(result.len());
    for row in 0..result.len() {
        let code = result
            .value(row, "code")
            .and_then(SqlValue::as_i64)
            .ok_or_else(|| {
                HistorianError::MalformedResult(format!(
                    "digital set {} returned a non-integer code",
                    name
                ))
            })?;
        let offset = result
            .value(row, "offset")
            .cloned()
            .unwrap_or(SqlValue::Null);
        states.push((code, offset));
    }
    Ok(DigitalSet {
        name: name.to_string(),
        states,
    })
}

/// Engineering units for a tag.
pub fn tag_unit<C: SqlConnection>(conn: &mut C, tag: &str) -> Result<String> {
    match point_metadata(conn, tag)? {
        Some(metadata) => Ok(metadata.unit),
        None => Err(HistorianError::TagNotFound(tag.to_string())),
    }
}

/// Point description for a tag.
pub fn tag_description<C: SqlConnection>(conn: &mut C, tag: &str) -> Result<String> {
    match point_metadata(conn, tag)? {
        Some(metadata) => Ok(metadata.description),
        None => Err(HistorianError::TagNotFound(tag.to_string())),
    }
}
