//! SQLplus query construction
//!
//! Builds the query text sent to IP.21. History reads, aggregate reads
//! and snapshot reads all project the same three aliased columns
//! (`"time"`, `"value"`, optionally `"status"`) so the normalizer never
//! needs to know which table served them.

use crate::aspen::metadata::FieldMapping;
use crate::error::{HistorianError, Result};
use crate::model::{Backend, ReadRequest, ReaderType};

/// Time literal format for SQLplus, UTC
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Build the read query for a validated request.
///
/// `mapping` is the resolved field mapping when the tag carried a
/// `;mapping` selector, and selects the history field and the snapshot
/// columns.
pub fn read_query(request: &ReadRequest, mapping: Option<&FieldMapping>) -> Result<String> {
    request.validate(Backend::Aspen)?;

    let tag = &request.tag.name;
    let reader = request.reader;

    let seconds = match reader {
        ReaderType::Sampled => 0,
        _ => request.interval.whole_seconds(),
    };

    // Request codes select the retrieval algorithm inside IP.21:
    // 4 = VALUES (actual recorded data), 3 = FITS, 7 = TIMES2_EXTENDED,
    // 0 = actual points for the counter family, 1 = aggregates default.
    let request_code = match reader {
        ReaderType::Sampled => Some(4),
        ReaderType::ShapePreserving => Some(3),
        ReaderType::Int => Some(7),
        ReaderType::Count | ReaderType::Good | ReaderType::Total | ReaderType::NotGood => Some(0),
        ReaderType::Snapshot => None,
        _ => Some(1),
    };

    let source = match reader {
        ReaderType::Sampled | ReaderType::ShapePreserving | ReaderType::Int => {
            "history".to_string()
        }
        ReaderType::Snapshot => format!("\"{}\"", tag),
        _ => "aggregates".to_string(),
    };

    let ts = match reader {
        ReaderType::Sampled | ReaderType::ShapePreserving | ReaderType::Int => "ts",
        ReaderType::Snapshot => mapping
            .and_then(|m| m.current_timestamp.as_deref())
            .unwrap_or("IP_INPUT_TIME"),
        _ => "ts_start",
    };

    let value = match reader {
        ReaderType::Min => "min",
        ReaderType::Max => "max",
        ReaderType::Rng => "rng",
        ReaderType::Avg => "avg",
        ReaderType::Var => "var",
        ReaderType::Std => "std",
        ReaderType::Good => "good",
        ReaderType::NotGood => "ng",
        ReaderType::Total | ReaderType::Sum => "sum",
        ReaderType::Snapshot => mapping
            .and_then(|m| m.current_value.as_deref())
            .unwrap_or("IP_INPUT_VALUE"),
        _ => "value",
    };

    let status = match reader {
        ReaderType::Snapshot => mapping
            .and_then(|m| m.current_quality.as_deref())
            .unwrap_or("IP_INPUT_QUALITY"),
        _ => "status",
    };

    let mut query = vec![format!(
        "SELECT ISO8601({}) AS \"time\", {} AS \"value\"",
        ts, value
    )];
    if request.include_status {
        // Status is returned as char regardless; the normalizer casts it
        query.push(format!(", {} AS \"status\"", status));
    }
    query.push(format!("FROM {}", source));

    if reader != ReaderType::Snapshot {
        let stop = request.range.stop.ok_or_else(|| {
            HistorianError::InvalidRequest(format!("a stop time is required for {}", reader))
        })?;
        let start = request.range.start.format(TIME_FORMAT);
        let stop = stop.format(TIME_FORMAT);

        query.push(format!("WHERE name = '{}'", tag));
        if let Some(history_value) = mapping.and_then(|m| m.history_value.as_deref()) {
            query.push(format!("AND FIELD_ID = FT('{}')", history_value));
        }
        if reader != ReaderType::Raw {
            query.push(format!("AND (period = {})", seconds * 10));
        }
        if let Some(code) = request_code {
            query.push(format!("AND (request = {})", code));
        }
        query.push(format!("AND (ts BETWEEN '{}' AND '{}')", start, stop));
        query.push("ORDER BY ts".to_string());
    }

    Ok(query.join(" "))
}

/// Tags matching a pattern, joined to their default field mapping
pub fn search_query(tag_pattern: &str) -> String {
    let comparison = if tag_pattern.contains('%') {
        format!("LIKE '{}'", tag_pattern)
    } else {
        format!("='{}'", tag_pattern)
    };

    format!(
        "SELECT DISTINCT a.name as tagname, m.NAME, m.MAP_DefinitionRecord, \
         m.MAP_IsDefault, m.MAP_Description, m.MAP_Units \
         FROM all_records a \
         LEFT JOIN atmapdef m ON a.definition = m.MAP_DefinitionRecord \
         WHERE a.name {} AND m.MAP_IsDefault = 'TRUE'",
        comparison
    )
}

/// Description of one tag through its mapping's description field,
/// optionally filtered by a description pattern
pub fn description_query(
    definition_record: &str,
    description_field: &str,
    tag: &str,
    description_pattern: Option<&str>,
) -> String {
    let mut query = vec![format!(
        "SELECT \"{}\" FROM {} WHERE name = '{}'",
        description_field, definition_record, tag
    )];
    if let Some(pattern) = description_pattern {
        query.push(format!("AND {} like '{}'", description_field, pattern));
    }
    query.join(" ")
}

/// All field mappings defined for one tag
pub fn mappings_query(tag: &str) -> String {
    format!(
        "SELECT m.NAME, m.MAP_DefinitionRecord, m.MAP_IsDefault, \
         m.MAP_Description, m.MAP_Units, m.MAP_CurrentValue, \
         m.MAP_CurrentTimeStamp, m.MAP_CurrentQuality, m.MAP_HistoryValue \
         FROM \"{}\" t \
         LEFT JOIN atmapdef m ON t.definition = m.MAP_DefinitionRecord",
        tag
    )
}

/// One field of one tag record, aliased for the normalizer
pub fn field_query(tag: &str, field: &str, alias: &str) -> String {
    format!("SELECT name, \"{}\" as {} FROM \"{}\"", field, alias, tag)
}
