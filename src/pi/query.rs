//! PI SQL query construction
//!
//! Builds queries against the piarchive function tables. Each reader
//! type maps to its own table; the projection is always `value`,
//! optionally the status triple, then `time`.

use crate::error::{HistorianError, Result};
use crate::model::{Backend, ReadRequest, ReaderType};

/// Time literal format for PI SQL, UTC
const TIME_FORMAT: &str = "%d-%b-%y %H:%M:%S";

/// Build the read query for a validated request.
///
/// `max_rows` caps raw reads with a TOP clause; the other tables bound
/// their output by interval count.
pub fn read_query(request: &ReadRequest, max_rows: usize) -> Result<String> {
    request.validate(Backend::Pi)?;

    let tag = request.tag.to_string();
    let reader = request.reader;

    let seconds = match reader {
        ReaderType::Sampled => 0,
        _ => request.interval.whole_seconds(),
    };

    let source = match reader {
        ReaderType::Int => "[piarchive]..[piinterp2]",
        ReaderType::Min => "[piarchive]..[pimin]",
        ReaderType::Max => "[piarchive]..[pimax]",
        ReaderType::Rng => "[piarchive]..[pirange]",
        ReaderType::Avg => "[piarchive]..[piavg]",
        ReaderType::Var | ReaderType::Std => "[piarchive]..[pistd]",
        ReaderType::Good | ReaderType::NotGood | ReaderType::Count => "[piarchive]..[picount]",
        ReaderType::Total | ReaderType::Sum => "[piarchive]..[pitotal]",
        ReaderType::Snapshot => "[piarchive]..[pisnapshot]",
        ReaderType::ShapePreserving => "[piarchive]..[piplot]",
        ReaderType::Raw | ReaderType::Sampled => "[piarchive]..[picomp2]",
    };

    // pistd serves VAR by squaring; picount serves GOOD/NOTGOOD through
    // the pctgood column
    let mut query = vec![match reader {
        ReaderType::Var => "SELECT POWER(CAST(value as FLOAT32), 2)".to_string(),
        ReaderType::Good => "SELECT CAST(pctgood as FLOAT32)".to_string(),
        ReaderType::NotGood => "SELECT 100-CAST(pctgood as FLOAT32)".to_string(),
        ReaderType::Raw => format!("SELECT TOP {} CAST(value as FLOAT32)", max_rows),
        _ => "SELECT CAST(value as FLOAT32)".to_string(),
    }];

    query.push("AS value,".to_string());
    if request.include_status {
        query.push("status, questionable, substituted,".to_string());
    }
    query.push(format!("time FROM {} WHERE tag='{}'", source, tag));

    if reader != ReaderType::Snapshot {
        let stop = request.range.stop.ok_or_else(|| {
            HistorianError::InvalidRequest(format!("a stop time is required for {}", reader))
        })?;
        let start = request.range.start.format(TIME_FORMAT);
        query.push(format!(
            "AND (time BETWEEN '{}' AND '{}')",
            start,
            stop.format(TIME_FORMAT)
        ));

        match reader {
            ReaderType::Good => query.push("AND questionable = FALSE".to_string()),
            ReaderType::NotGood => query.push("AND questionable = TRUE".to_string()),
            ReaderType::ShapePreserving => {
                let count = (stop - request.range.start).num_seconds() / seconds;
                query.push(format!("AND (intervalcount = {})", count));
            }
            ReaderType::Raw => {}
            _ => query.push(format!("AND (timestep = '{}s')", seconds)),
        }

        query.push("ORDER BY time".to_string());
    }

    Ok(query.join(" "))
}

/// Point search over the point table.
///
/// Patterns must already be in SQL LIKE form; at least one of them is
/// required.
pub fn search_query(tag: Option<&str>, description: Option<&str>) -> Result<String> {
    if tag.is_none() && description.is_none() {
        return Err(HistorianError::InvalidRequest(
            "pi search requires a tag or description pattern".to_string(),
        ));
    }

    let mut query = vec!["SELECT tag, descriptor as description FROM pipoint.pipoint2 WHERE"
        .to_string()];
    if let Some(tag) = tag {
        query.push(format!("tag LIKE '{}'", tag));
    }
    if tag.is_some() && description.is_some() {
        query.push("AND".to_string());
    }
    if let Some(description) = description {
        query.push(format!("descriptor LIKE '{}'", description));
    }

    Ok(query.join(" "))
}

/// Point metadata: digital set name, units and description
pub fn point_query(tag: &str) -> String {
    format!(
        "SELECT digitalset, engunits, descriptor FROM pipoint.pipoint2 WHERE tag='{}'",
        tag
    )
}

/// States of a digital set
pub fn digital_set_query(set_name: &str) -> String {
    format!(
        "SELECT code, offset FROM pids WHERE digitalset='{}'",
        set_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SampleInterval, TimeRange};
    use chrono::{TimeZone, Utc};

    const MAX_ROWS: usize = 100000;

    fn hour_range() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2018, 1, 17, 16, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 1, 17, 17, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_interpolated_query() {
        let request = ReadRequest::new("ATCAI", ReaderType::Int, hour_range())
            .interval(SampleInterval::from_seconds(60));
        let sql = read_query(&request, MAX_ROWS).unwrap();
        assert_eq!(
            sql,
            "SELECT CAST(value as FLOAT32) AS value, time FROM [piarchive]..[piinterp2] \
             WHERE tag='ATCAI' \
             AND (time BETWEEN '17-Jan-18 16:00:00' AND '17-Jan-18 17:00:00') \
             AND (timestep = '60s') ORDER BY time"
        );
    }

    #[test]
    fn test_raw_query_caps_rows() {
        let request = ReadRequest::new("ATCAI", ReaderType::Raw, hour_range());
        let sql = read_query(&request, 5000).unwrap();
        assert_eq!(
            sql,
            "SELECT TOP 5000 CAST(value as FLOAT32) AS value, time \
             FROM [piarchive]..[picomp2] WHERE tag='ATCAI' \
             AND (time BETWEEN '17-Jan-18 16:00:00' AND '17-Jan-18 17:00:00') \
             ORDER BY time"
        );
    }

    #[test]
    fn test_sampled_query_with_status() {
        let request = ReadRequest::new("ATCAI", ReaderType::Sampled, hour_range()).with_status();
        let sql = read_query(&request, MAX_ROWS).unwrap();
        assert_eq!(
            sql,
            "SELECT CAST(value as FLOAT32) AS value, status, questionable, substituted, \
             time FROM [piarchive]..[picomp2] WHERE tag='ATCAI' \
             AND (time BETWEEN '17-Jan-18 16:00:00' AND '17-Jan-18 17:00:00') \
             AND (timestep = '0s') ORDER BY time"
        );
    }

    #[test]
    fn test_variance_squares_stddev() {
        let request = ReadRequest::new("ATCAI", ReaderType::Var, hour_range())
            .interval(SampleInterval::from_minutes(10));
        let sql = read_query(&request, MAX_ROWS).unwrap();
        assert_eq!(
            sql,
            "SELECT POWER(CAST(value as FLOAT32), 2) AS value, time \
             FROM [piarchive]..[pistd] WHERE tag='ATCAI' \
             AND (time BETWEEN '17-Jan-18 16:00:00' AND '17-Jan-18 17:00:00') \
             AND (timestep = '600s') ORDER BY time"
        );
    }

    #[test]
    fn test_good_filters_questionable_without_timestep() {
        let request = ReadRequest::new("ATCAI", ReaderType::Good, hour_range())
            .interval(SampleInterval::from_seconds(60));
        let sql = read_query(&request, MAX_ROWS).unwrap();
        assert_eq!(
            sql,
            "SELECT CAST(pctgood as FLOAT32) AS value, time \
             FROM [piarchive]..[picount] WHERE tag='ATCAI' \
             AND (time BETWEEN '17-Jan-18 16:00:00' AND '17-Jan-18 17:00:00') \
             AND questionable = FALSE ORDER BY time"
        );

        let notgood = ReadRequest::new("ATCAI", ReaderType::NotGood, hour_range())
            .interval(SampleInterval::from_seconds(60));
        let sql = read_query(&notgood, MAX_ROWS).unwrap();
        assert!(sql.starts_with("SELECT 100-CAST(pctgood as FLOAT32)"));
        assert!(sql.contains("AND questionable = TRUE"));
        assert!(!sql.contains("timestep"));
    }

    #[test]
    fn test_plot_query_interval_count() {
        let request = ReadRequest::new("ATCAI", ReaderType::ShapePreserving, hour_range())
            .interval(SampleInterval::from_seconds(60));
        let sql = read_query(&request, MAX_ROWS).unwrap();
        assert_eq!(
            sql,
            "SELECT CAST(value as FLOAT32) AS value, time \
             FROM [piarchive]..[piplot] WHERE tag='ATCAI' \
             AND (time BETWEEN '17-Jan-18 16:00:00' AND '17-Jan-18 17:00:00') \
             AND (intervalcount = 60) ORDER BY time"
        );
    }

    #[test]
    fn test_snapshot_query() {
        let start = Utc.with_ymd_and_hms(2018, 1, 17, 16, 0, 0).unwrap();
        let request =
            ReadRequest::new("ATCAI", ReaderType::Snapshot, TimeRange::from_start(start))
                .with_status();
        let sql = read_query(&request, MAX_ROWS).unwrap();
        assert_eq!(
            sql,
            "SELECT CAST(value as FLOAT32) AS value, status, questionable, substituted, \
             time FROM [piarchive]..[pisnapshot] WHERE tag='ATCAI'"
        );
    }

    #[test]
    fn test_builder_rejects_invalid_requests() {
        let request = ReadRequest::new("ATCAI", ReaderType::Avg, hour_range());
        assert!(matches!(
            read_query(&request, MAX_ROWS),
            Err(HistorianError::InvalidRequest(_))
        ));

        let request = ReadRequest::new("ATCAI", ReaderType::Snapshot, hour_range());
        assert!(matches!(
            read_query(&request, MAX_ROWS),
            Err(HistorianError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_search_query_forms() {
        assert_eq!(
            search_query(Some("ATC%"), None).unwrap(),
            "SELECT tag, descriptor as description FROM pipoint.pipoint2 WHERE tag LIKE 'ATC%'"
        );
        assert_eq!(
            search_query(None, Some("Sine%")).unwrap(),
            "SELECT tag, descriptor as description FROM pipoint.pipoint2 \
             WHERE descriptor LIKE 'Sine%'"
        );
        assert_eq!(
            search_query(Some("ATC%"), Some("Sine%")).unwrap(),
            "SELECT tag, descriptor as description FROM pipoint.pipoint2 \
             WHERE tag LIKE 'ATC%' AND descriptor LIKE 'Sine%'"
        );
        assert!(matches!(
            search_query(None, None),
            Err(HistorianError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_metadata_queries() {
        assert_eq!(
            point_query("ATCAI"),
            "SELECT digitalset, engunits, descriptor FROM pipoint.pipoint2 WHERE tag='ATCAI'"
        );
        assert_eq!(
            digital_set_query("ControllerMode"),
            "SELECT code, offset FROM pids WHERE digitalset='ControllerMode'"
        );
    }
}
