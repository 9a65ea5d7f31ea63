//! Result normalization for PI reads
//!
//! PI reads need more than column renaming: summary tables stamp each
//! aggregate at the end of its interval, digital points archive state
//! codes instead of state names, and quality arrives as three separate
//! columns that fold into one status integer.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::connection::{ResultSet, SqlValue};
use crate::error::{HistorianError, Result};
use crate::model::{CanonicalSeries, ReaderType, SampleInterval};
use crate::pi::metadata::DigitalSet;

/// Timestamps as returned by the PI ODBC driver, fractional seconds
/// optional
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Turn a read result into the canonical series named `name`.
///
/// Summary reads are re-anchored to the start of their interval and
/// lose their first row, which describes the interval before the
/// requested range. Digital state codes are replaced with state names
/// when a digital set is given.
pub fn normalize(
    result: &ResultSet,
    name: &str,
    with_status: bool,
    reader: ReaderType,
    interval: SampleInterval,
    digital_set: Option<&DigitalSet>,
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
    let status_cols = if with_status {
        Some((
            column(result, "status")?,
            column(result, "questionable")?,
            column(result, "substituted")?,
        ))
    } else {
        None
    };

    let mut timestamps = Vec::with_capacity(result.len());
    let mut values = Vec::with_capacity(result.len());
    let mut status = status_cols.map(|_| Vec::with_capacity(result.len()));

    for row in &result.rows {
        timestamps.push(parse_time(&row[time_col])?);
        values.push(row[value_col].clone());
        if let (Some(status), Some((s, q, sub))) = (status.as_mut(), status_cols) {
            status.push(compose_status(&row[s], &row[q], &row[sub])?);
        }
    }

    if reader.is_summary() {
        let shift = interval.as_duration();
        for timestamp in timestamps.iter_mut() {
            *timestamp -= shift;
        }
        timestamps.remove(0);
        values.remove(0);
        if let Some(status) = status.as_mut() {
            status.remove(0);
        }
    }

    if let Some(set) = digital_set {
        for value in values.iter_mut() {
            if let Some(state) = set.translate(value) {
                *value = state.clone();
            }
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

// One status integer per sample: bit 0 questionable, bit 1 nonzero
// system status, bit 2 substituted.
fn compose_status(status: &SqlValue, questionable: &SqlValue, substituted: &SqlValue) -> Result<i64> {
    let system = flag(status)?;
    let questionable = flag(questionable)?;
    let substituted = flag(substituted)?;
    Ok(i64::from(questionable != 0) + 2 * i64::from(system != 0) + 4 * i64::from(substituted != 0))
}

fn flag(value: &SqlValue) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| HistorianError::MalformedResult(format!("bad status cell: {:?}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn time_text(minute: u32) -> SqlValue {
        SqlValue::Text(format!("2018-01-17 16:{:02}:00", minute))
    }

    fn stamp(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 1, 17, 16, minute, 0).unwrap()
    }

    #[test]
    fn test_raw_values_and_times() {
        let result = ResultSet::with_rows(
            vec!["value".to_string(), "time".to_string()],
            vec![
                vec![SqlValue::Real(24.5), time_text(0)],
                vec![
                    SqlValue::Real(24.6),
                    SqlValue::Text("2018-01-17 16:01:00.5".to_string()),
                ],
            ],
        );
        let series = normalize(
            &result,
            "ATCAI",
            false,
            ReaderType::Raw,
            SampleInterval::zero(),
            None,
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.timestamps[0], stamp(0));
        assert_eq!(series.timestamps[1], stamp(1) + Duration::milliseconds(500));
        assert_eq!(series.values[0], SqlValue::Real(24.5));
        assert_eq!(series.status, None);
    }

    #[test]
    fn test_summary_rows_anchor_to_interval_start() {
        let result = ResultSet::with_rows(
            vec!["value".to_string(), "time".to_string()],
            vec![
                vec![SqlValue::Real(1.0), time_text(0)],
                vec![SqlValue::Real(2.0), time_text(10)],
                vec![SqlValue::Real(3.0), time_text(20)],
            ],
        );
        let series = normalize(
            &result,
            "ATCAI",
            false,
            ReaderType::Avg,
            SampleInterval::from_minutes(10),
            None,
        )
        .unwrap();
        // the first row summarizes the interval before the range
        assert_eq!(series.timestamps, vec![stamp(0), stamp(10)]);
        assert_eq!(
            series.values,
            vec![SqlValue::Real(2.0), SqlValue::Real(3.0)]
        );
    }

    #[test]
    fn test_digital_codes_become_state_names() {
        let set = DigitalSet {
            name: "Modes".to_string(),
            states: vec![
                (0, SqlValue::Text("Off".to_string())),
                (1, SqlValue::Text("On".to_string())),
            ],
        };
        let result = ResultSet::with_rows(
            vec!["value".to_string(), "time".to_string()],
            vec![
                vec![SqlValue::Real(0.0), time_text(0)],
                vec![SqlValue::Real(1.0), time_text(1)],
                vec![SqlValue::Real(2.0), time_text(2)],
            ],
        );
        let series = normalize(
            &result,
            "CDEP158",
            false,
            ReaderType::Int,
            SampleInterval::from_seconds(60),
            Some(&set),
        )
        .unwrap();
        assert_eq!(
            series.values,
            vec![
                SqlValue::Text("Off".to_string()),
                SqlValue::Text("On".to_string()),
                SqlValue::Real(2.0),
            ]
        );
    }

    #[test]
    fn test_status_bits() {
        let result = ResultSet::with_rows(
            vec![
                "value".to_string(),
                "status".to_string(),
                "questionable".to_string(),
                "substituted".to_string(),
                "time".to_string(),
            ],
            vec![
                vec![
                    SqlValue::Real(1.0),
                    SqlValue::Integer(0),
                    SqlValue::Bool(true),
                    SqlValue::Integer(0),
                    time_text(0),
                ],
                vec![
                    SqlValue::Real(2.0),
                    SqlValue::Integer(-253),
                    SqlValue::Bool(false),
                    SqlValue::Integer(1),
                    time_text(1),
                ],
                vec![
                    SqlValue::Real(3.0),
                    SqlValue::Integer(0),
                    SqlValue::Bool(false),
                    SqlValue::Integer(0),
                    time_text(2),
                ],
            ],
        );
        let series = normalize(
            &result,
            "ATCAI",
            true,
            ReaderType::Sampled,
            SampleInterval::zero(),
            None,
        )
        .unwrap();
        assert_eq!(series.status, Some(vec![1, 6, 0]));
        assert_eq!(series.status_name(), "ATCAI::status");
    }

    #[test]
    fn test_empty_summary_result_stays_empty() {
        let result = ResultSet::new(vec!["value".to_string(), "time".to_string()]);
        let series = normalize(
            &result,
            "ATCAI",
            true,
            ReaderType::Avg,
            SampleInterval::from_minutes(10),
            None,
        )
        .unwrap();
        assert!(series.is_empty());
        assert_eq!(series.status, Some(Vec::new()));
    }

    #[test]
    fn test_missing_quality_column_is_malformed() {
        let result = ResultSet::with_rows(
            vec![
                "value".to_string(),
                "status".to_string(),
                "time".to_string(),
            ],
            vec![vec![SqlValue::Real(1.0), SqlValue::Integer(0), time_text(0)]],
        );
        let err = normalize(
            &result,
            "ATCAI",
            true,
            ReaderType::Sampled,
            SampleInterval::zero(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, HistorianError::MalformedResult(_)));
    }
}
