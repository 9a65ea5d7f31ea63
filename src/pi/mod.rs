//! OSIsoft PI backend
//!
//! This module serves read requests through the PI ODBC gateway:
//!
//! - **query**: piarchive query text construction
//! - **metadata**: point table and digital set lookups
//! - **normalize**: result decoding into the canonical series
//!
//! The session owns one blocking connection and serves one operation at
//! a time. Requests are validated before any statement is sent, and
//! every read starts with a point table lookup so digital points can be
//! decoded.

pub mod metadata;
pub mod normalize;
pub mod query;

use crate::config::SourceConfig;
use crate::connection::{ResultSet, SqlConnection, SqlDriver};
use crate::error::{HistorianError, Result};
use crate::model::{Backend, CanonicalSeries, ReadRequest, Tag};
use crate::session::{Historian, TagMatch};

/// Row cap applied to raw reads when no source config says otherwise
pub const DEFAULT_MAX_ROWS: usize = 100_000;

/// Session against a PI historian
pub struct PiHistorian<C: SqlConnection> {
    conn: C,
    max_rows: usize,
}

impl<C: SqlConnection> PiHistorian<C> {
    /// Wrap an already open connection
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Set the row cap for raw reads
    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Open a session from a source definition
    pub fn connect<D>(driver: &D, config: &SourceConfig) -> Result<Self>
    where
        D: SqlDriver<Connection = C>,
    {
        if config.backend != Backend::Pi {
            return Err(HistorianError::Config(format!(
                "source backend is {}, expected pi",
                config.backend
            )));
        }
        let conn = driver.connect(&config.connection_string())?;
        Ok(Self::new(conn).max_rows(config.max_rows))
    }
}

impl<C: SqlConnection> Historian for PiHistorian<C> {
    fn backend(&self) -> Backend {
        Backend::Pi
    }

    fn search(&mut self, tag: Option<&str>, description: Option<&str>) -> Result<Vec<TagMatch>> {
        let tag = tag.map(|t| t.replace('*', "%"));
        let description = description.map(|d| d.replace('*', "%"));

        let sql = query::search_query(tag.as_deref(), description.as_deref())?;
        let result = self.conn.execute(&sql)?;

        let mut matches = Vec::with_capacity(result.len());
        for row in 0..result.len() {
            let name = match result.value(row, "tag") {
                Some(value) if !value.is_null() => value.to_string(),
                _ => continue,
            };
            let description = match result.value(row, "description") {
                Some(value) if !value.is_null() => value.to_string(),
                _ => String::new(),
            };
            matches.push(TagMatch { name, description });
        }
        Ok(matches)
    }

    fn read(&mut self, request: &ReadRequest) -> Result<CanonicalSeries> {
        request.validate(Backend::Pi)?;

        let name = request.tag.to_string();
        let point = match metadata::point_metadata(&mut self.conn, &name)? {
            Some(point) => point,
            None => {
                tracing::warn!(tag = %name, "tag not found in point table");
                let mut series = CanonicalSeries::empty(&name);
                if request.include_status {
                    series.status = Some(Vec::new());
                }
                return Ok(series);
            }
        };

        let sql = query::read_query(request, self.max_rows)?;
        tracing::debug!(tag = %name, reader = %request.reader, "executing pi read");
        let result = self.conn.execute(&sql)?;

        let digital = match point.digital_set.as_deref() {
            Some(set_name) => Some(metadata::digital_set(&mut self.conn, set_name)?),
            None => None,
        };

        normalize::normalize(
            &result,
            &name,
            request.include_status,
            request.reader,
            request.interval,
            digital.as_ref(),
        )
    }

    fn tag_unit(&mut self, tag: &Tag) -> Result<String> {
        metadata::tag_unit(&mut self.conn, &tag.to_string())
    }

    fn tag_description(&mut self, tag: &Tag) -> Result<String> {
        metadata::tag_description(&mut self.conn, &tag.to_string())
    }

    fn raw_query(&mut self, sql: &str) -> Result<ResultSet> {
        Ok(self.conn.execute(sql)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::FakeConnection;
    use crate::connection::{SqlValue, SqliteConnection};
    use crate::model::{ReaderType, SampleInterval, TimeRange};
    use chrono::{TimeZone, Utc};

    // Surfaces the session's tracing output when tests run with
    // RUST_LOG set
    fn init_logging() {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "historian=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    }

    fn hour_range() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2018, 1, 17, 16, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2018, 1, 17, 17, 0, 0).unwrap(),
        )
    }

    fn point_result(digital_set: &str) -> ResultSet {
        ResultSet::with_rows(
            vec![
                "digitalset".to_string(),
                "engunits".to_string(),
                "descriptor".to_string(),
            ],
            vec![vec![
                SqlValue::Text(digital_set.to_string()),
                SqlValue::Text("DEG. C".to_string()),
                SqlValue::Text("Atmospheric Tower AI".to_string()),
            ]],
        )
    }

    fn read_result(values: &[f64]) -> ResultSet {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                vec![
                    SqlValue::Real(*v),
                    SqlValue::Text(format!("2018-01-17 16:{:02}:00", i)),
                ]
            })
            .collect();
        ResultSet::with_rows(vec!["value".to_string(), "time".to_string()], rows)
    }

    #[test]
    fn test_invalid_request_executes_no_query() {
        let mut historian = PiHistorian::new(FakeConnection::new());

        let missing_interval = ReadRequest::new("ATCAI", ReaderType::Avg, hour_range());
        assert!(matches!(
            historian.read(&missing_interval),
            Err(HistorianError::InvalidRequest(_))
        ));

        let snapshot_with_stop = ReadRequest::new("ATCAI", ReaderType::Snapshot, hour_range());
        assert!(matches!(
            historian.read(&snapshot_with_stop),
            Err(HistorianError::InvalidRequest(_))
        ));

        assert!(historian.conn.log.is_empty());
    }

    #[test]
    fn test_read_looks_up_point_then_archive() {
        let conn = FakeConnection::new()
            .expect(point_result(""))
            .expect(read_result(&[24.5, 24.6]));
        let mut historian = PiHistorian::new(conn);

        let request = ReadRequest::new("ATCAI", ReaderType::Int, hour_range())
            .interval(SampleInterval::from_seconds(60));
        let series = historian.read(&request).unwrap();

        assert_eq!(series.name, "ATCAI");
        assert_eq!(series.len(), 2);
        assert_eq!(historian.conn.log.len(), 2);
        assert!(historian.conn.log[0].starts_with("SELECT digitalset, engunits, descriptor"));
        assert!(historian.conn.log[1].contains("[piarchive]..[piinterp2]"));
    }

    #[test]
    fn test_unknown_tag_reads_empty() {
        init_logging();
        let empty_point = ResultSet::new(vec![
            "digitalset".to_string(),
            "engunits".to_string(),
            "descriptor".to_string(),
        ]);
        let conn = FakeConnection::new().expect(empty_point);
        let mut historian = PiHistorian::new(conn);

        let request = ReadRequest::new("NOSUCHTAG", ReaderType::Raw, hour_range()).with_status();
        let series = historian.read(&request).unwrap();

        assert_eq!(series.name, "NOSUCHTAG");
        assert!(series.is_empty());
        assert_eq!(series.status, Some(Vec::new()));
        // The archive query never ran
        assert_eq!(historian.conn.log.len(), 1);
    }

    #[test]
    fn test_digital_read_translates_states() {
        let states = ResultSet::with_rows(
            vec!["code".to_string(), "offset".to_string()],
            vec![
                vec![SqlValue::Integer(0), SqlValue::Text("Off".to_string())],
                vec![SqlValue::Integer(1), SqlValue::Text("On".to_string())],
            ],
        );
        let conn = FakeConnection::new()
            .expect(point_result("Modes"))
            .expect(read_result(&[0.0, 1.0]))
            .expect(states);
        let mut historian = PiHistorian::new(conn);

        let request = ReadRequest::new("CDEP158", ReaderType::Int, hour_range())
            .interval(SampleInterval::from_seconds(60));
        let series = historian.read(&request).unwrap();

        assert_eq!(historian.conn.log.len(), 3);
        assert!(historian.conn.log[2].contains("FROM pids WHERE digitalset='Modes'"));
        assert_eq!(
            series.values,
            vec![
                SqlValue::Text("Off".to_string()),
                SqlValue::Text("On".to_string()),
            ]
        );
    }

    #[test]
    fn test_raw_read_uses_configured_row_cap() {
        let conn = FakeConnection::new()
            .expect(point_result(""))
            .expect(read_result(&[1.0]));
        let mut historian = PiHistorian::new(conn).max_rows(42);

        let request = ReadRequest::new("ATCAI", ReaderType::Raw, hour_range());
        historian.read(&request).unwrap();

        assert!(historian.conn.log[1].starts_with("SELECT TOP 42 "));
    }

    fn search_fixture() -> SqliteConnection {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "ATTACH ':memory:' AS pipoint;
             CREATE TABLE pipoint.pipoint2 (tag TEXT, digitalset TEXT, engunits TEXT, descriptor TEXT);
             INSERT INTO pipoint.pipoint2 VALUES
                 ('ATCAI', '', 'DEG. C', 'Atmospheric Tower AI'),
                 ('ATCMV', '', 'PCT', 'Sine wave'),
                 ('XYZ', '', '', NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_search_patterns() {
        let mut historian = PiHistorian::new(search_fixture());

        let matches = historian.search(Some("ATC*"), None).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name, "ATCAI");
        assert_eq!(matches[0].description, "Atmospheric Tower AI");

        let matches = historian.search(Some("*"), Some("Sine*")).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "ATCMV");

        let matches = historian.search(None, Some("*wave*")).unwrap();
        assert_eq!(matches.len(), 1);

        // NULL descriptions come back empty
        let matches = historian.search(Some("XYZ"), None).unwrap();
        assert_eq!(matches[0].description, "");

        assert!(matches!(
            historian.search(None, None),
            Err(HistorianError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_unit_lookup() {
        let mut historian = PiHistorian::new(search_fixture());
        assert_eq!(historian.tag_unit(&Tag::new("ATCAI")).unwrap(), "DEG. C");
        assert!(matches!(
            historian.tag_unit(&Tag::new("NOSUCHTAG")),
            Err(HistorianError::TagNotFound(_))
        ));
    }
}
