//! Field mapping resolution for IP.21
//!
//! IP.21 tags reach their record fields through map records (atmapdef):
//! a mapping names the definition record and the fields that hold the
//! description, engineering units, current value and history value.
//! Mappings are resolved fresh on every call, never cached, so repository
//! reconfiguration is picked up immediately.

use std::collections::HashSet;

use crate::aspen::query;
use crate::connection::{ResultSet, SqlConnection};
use crate::error::{HistorianError, Result};
use crate::model::Tag;

/// One atmapdef record for a tag
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    /// Mapping name, matched case-insensitively against selectors
    pub name: String,
    /// Definition record holding the mapped fields
    pub definition_record: Option<String>,
    /// Whether this is the tag's default mapping
    pub is_default: bool,
    /// Field holding the description
    pub description_field: Option<String>,
    /// Field holding the engineering units
    pub units_field: Option<String>,
    /// Field holding the current value (snapshot reads)
    pub current_value: Option<String>,
    /// Field holding the current value's timestamp
    pub current_timestamp: Option<String>,
    /// Field holding the current value's quality
    pub current_quality: Option<String>,
    /// Field selecting the history series (FT filter)
    pub history_value: Option<String>,
}

/// One row of the tag search query: a tag and its default mapping
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchHit {
    pub tag: String,
    pub definition_record: Option<String>,
    pub description_field: Option<String>,
}

fn text(result: &ResultSet, row: usize, column: &str) -> Option<String> {
    result
        .value(row, column)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Decode mapping rows; left-join rows without a mapping have a NULL
/// NAME and are skipped
pub(crate) fn parse_mappings(result: &ResultSet) -> Vec<FieldMapping> {
    let mut mappings = Vec::new();
    for row in 0..result.len() {
        let name = match text(result, row, "NAME") {
            Some(name) => name,
            None => continue,
        };
        mappings.push(FieldMapping {
            name,
            definition_record: text(result, row, "MAP_DefinitionRecord"),
            is_default: text(result, row, "MAP_IsDefault").as_deref() == Some("TRUE"),
            description_field: text(result, row, "MAP_Description"),
            units_field: text(result, row, "MAP_Units"),
            current_value: text(result, row, "MAP_CurrentValue"),
            current_timestamp: text(result, row, "MAP_CurrentTimeStamp"),
            current_quality: text(result, row, "MAP_CurrentQuality"),
            history_value: text(result, row, "MAP_HistoryValue"),
        });
    }
    mappings
}

/// Decode search rows, keeping the first mapping row per tag
pub(crate) fn parse_search_hits(result: &ResultSet) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    let mut hits = Vec::new();
    for row in 0..result.len() {
        let tag = match text(result, row, "tagname") {
            Some(tag) => tag,
            None => continue,
        };
        if !seen.insert(tag.clone()) {
            continue;
        }
        hits.push(SearchHit {
            tag,
            definition_record: text(result, row, "MAP_DefinitionRecord"),
            description_field: text(result, row, "MAP_Description"),
        });
    }
    hits
}

/// All mappings defined for a tag
pub fn fetch_mappings<C: SqlConnection>(
    conn: &mut C,
    tag: &str,
) -> Result<Vec<FieldMapping>> {
    let result = conn.execute(&query::mappings_query(tag))?;
    Ok(parse_mappings(&result))
}

/// The mapping named by a selector, matched case-insensitively
pub fn resolve_mapping<C: SqlConnection>(
    conn: &mut C,
    tag: &str,
    selector: &str,
) -> Result<FieldMapping> {
    fetch_mappings(conn, tag)?
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(selector))
        .ok_or_else(|| HistorianError::TagNotFound(format!("{};{}", tag, selector)))
}

/// The tag's default mapping
pub fn default_mapping<C: SqlConnection>(conn: &mut C, tag: &str) -> Result<FieldMapping> {
    fetch_mappings(conn, tag)?
        .into_iter()
        .find(|m| m.is_default)
        .ok_or_else(|| {
            HistorianError::TagNotFound(format!("{} has no default field mapping", tag))
        })
}

/// Mapping for metadata lookups: the named one if the tag carries a
/// selector, the default otherwise
fn lookup_mapping<C: SqlConnection>(conn: &mut C, tag: &Tag) -> Result<FieldMapping> {
    match &tag.mapping {
        Some(selector) => resolve_mapping(conn, &tag.name, selector),
        None => default_mapping(conn, &tag.name),
    }
}

/// Engineering units of a tag, empty string when the record holds none
pub fn tag_unit<C: SqlConnection>(conn: &mut C, tag: &Tag) -> Result<String> {
    let mapping = lookup_mapping(conn, tag)?;
    let field = match mapping.units_field {
        Some(field) => field,
        None => {
            tracing::debug!(tag = %tag, mapping = %mapping.name, "mapping has no units field");
            return Ok(String::new());
        }
    };
    read_field(conn, &tag.name, &field, "engunit")
}

/// Description of a tag, empty string when the record holds none
pub fn tag_description<C: SqlConnection>(conn: &mut C, tag: &Tag) -> Result<String> {
    let mapping = lookup_mapping(conn, tag)?;
    let field = match mapping.description_field {
        Some(field) => field,
        None => {
            tracing::debug!(tag = %tag, mapping = %mapping.name, "mapping has no description field");
            return Ok(String::new());
        }
    };
    read_field(conn, &tag.name, &field, "description")
}

fn read_field<C: SqlConnection>(
    conn: &mut C,
    tag: &str,
    field: &str,
    alias: &str,
) -> Result<String> {
    let result = conn.execute(&query::field_query(tag, field, alias))?;
    if result.is_empty() {
        return Err(HistorianError::TagNotFound(tag.to_string()));
    }
    let value = result.value(0, alias).ok_or_else(|| {
        HistorianError::MalformedResult(format!("missing {} column for {}", alias, tag))
    })?;
    if value.is_null() {
        Ok(String::new())
    } else {
        Ok(value.to_string())
    }
}
