//! AspenTech IP.21 (SQLplus) backend
//!
//! This module serves read requests against IP.21 historians:
//!
//! - **query**: SQLplus query text construction
//! - **metadata**: atmapdef field-mapping resolution
//! - **normalize**: result decoding into the canonical series
//!
//! The session owns one blocking connection and serves one operation at
//! a time. Requests are validated before any statement is sent.

pub mod metadata;
pub mod normalize;
pub mod query;

use std::collections::BTreeSet;

use crate::config::SourceConfig;
use crate::connection::{ResultSet, SqlConnection, SqlDriver};
use crate::error::{HistorianError, Result};
use crate::model::{Backend, CanonicalSeries, ReadRequest, Tag};
use crate::session::{Historian, TagMatch};

/// Session against an IP.21 historian
pub struct AspenHistorian<C: SqlConnection> {
    conn: C,
}

impl<C: SqlConnection> AspenHistorian<C> {
    /// Wrap an already open connection
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// Open a session from a source definition
    pub fn connect<D>(driver: &D, config: &SourceConfig) -> Result<Self>
    where
        D: SqlDriver<Connection = C>,
    {
        if config.backend != Backend::Aspen {
            return Err(HistorianError::Config(format!(
                "source backend is {}, expected aspen",
                config.backend
            )));
        }
        let conn = driver.connect(&config.connection_string())?;
        Ok(Self::new(conn))
    }
}

impl<C: SqlConnection> Historian for AspenHistorian<C> {
    fn backend(&self) -> Backend {
        Backend::Aspen
    }

    /// Two-stage search: find tags and their default mapping, then read
    /// each tag's description through that mapping. Results are
    /// deduplicated and sorted.
    fn search(&mut self, tag: Option<&str>, description: Option<&str>) -> Result<Vec<TagMatch>> {
        let tag = tag.ok_or_else(|| {
            HistorianError::InvalidRequest("aspen search requires a tag pattern".to_string())
        })?;
        let tag = tag.replace('*', "%");
        let description = description.map(|d| d.replace('*', "%"));

        let result = self.conn.execute(&query::search_query(&tag))?;
        let hits = metadata::parse_search_hits(&result);

        let mut matches = BTreeSet::new();
        for hit in hits {
            // Records without a resolvable description field are skipped
            let (record, field) = match (&hit.definition_record, &hit.description_field) {
                (Some(record), Some(field)) => (record, field),
                _ => continue,
            };

            let sql = query::description_query(record, field, &hit.tag, description.as_deref());
            let result = self.conn.execute(&sql)?;
            let row = match result.rows.first() {
                Some(row) => row,
                // No row means the description filter did not match
                None => continue,
            };

            let description = match row.first() {
                Some(value) if !value.is_null() => value.to_string(),
                _ => String::new(),
            };
            matches.insert(TagMatch {
                name: hit.tag,
                description,
            });
        }

        Ok(matches.into_iter().collect())
    }

    fn read(&mut self, request: &ReadRequest) -> Result<CanonicalSeries> {
        request.validate(Backend::Aspen)?;

        // Only an explicit selector resolves a mapping on the read path
        let mapping = match &request.tag.mapping {
            Some(selector) => Some(metadata::resolve_mapping(
                &mut self.conn,
                &request.tag.name,
                selector,
            )?),
            None => None,
        };

        let sql = query::read_query(request, mapping.as_ref())?;
        tracing::debug!(tag = %request.tag, reader = %request.reader, "executing aspen read");
        let result = self.conn.execute(&sql)?;
        normalize::normalize(&result, &request.tag.to_string(), request.include_status)
    }

    fn tag_unit(&mut self, tag: &Tag) -> Result<String> {
        metadata::tag_unit(&mut self.conn, tag)
    }

    fn tag_description(&mut self, tag: &Tag) -> Result<String> {
        metadata::tag_description(&mut self.conn, tag)
    }

    fn raw_query(&mut self, sql: &str) -> Result<ResultSet> {
        Ok(self.conn.execute(sql)?)
    }
}
