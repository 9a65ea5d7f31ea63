//! Backend sessions
//!
//! A session owns one blocking connection to a historian and exposes
//! the operations both backends share. [`connect`] picks the backend
//! from the source definition and hands back a trait object, so
//! callers that read from several plants do not need to know which
//! vendor sits behind each source.

use serde::{Deserialize, Serialize};

use crate::aspen::AspenHistorian;
use crate::config::SourceConfig;
use crate::connection::{ResultSet, SqlDriver};
use crate::error::Result;
use crate::model::{Backend, CanonicalSeries, ReadRequest, Tag};
use crate::pi::PiHistorian;

/// One tag found by a search, with its description
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagMatch {
    pub name: String,
    pub description: String,
}

/// The operations every historian session serves.
///
/// Implementations are synchronous and serve one operation at a time;
/// open one session per thread when reading concurrently.
pub trait Historian {
    /// Which backend this session speaks to
    fn backend(&self) -> Backend;

    /// Find tags by name pattern and optionally filter on description.
    /// `*` is accepted as wildcard alongside SQL `%`.
    fn search(&mut self, tag: Option<&str>, description: Option<&str>) -> Result<Vec<TagMatch>>;

    /// Read one tag over a time range into a canonical UTC series
    fn read(&mut self, request: &ReadRequest) -> Result<CanonicalSeries>;

    /// Engineering units for a tag
    fn tag_unit(&mut self, tag: &Tag) -> Result<String>;

    /// Description for a tag
    fn tag_description(&mut self, tag: &Tag) -> Result<String>;

    /// Run a statement verbatim and return the materialized result
    fn raw_query(&mut self, sql: &str) -> Result<ResultSet>;
}

/// Open a session for a configured source.
///
/// Dispatches on the source's backend; the connection string is built
/// from the source definition unless it carries an explicit override.
pub fn connect<D>(driver: &D, config: &SourceConfig) -> Result<Box<dyn Historian>>
where
    D: SqlDriver,
    D::Connection: 'static,
{
    match config.backend {
        Backend::Aspen => Ok(Box::new(AspenHistorian::connect(driver, config)?)),
        Backend::Pi => Ok(Box::new(PiHistorian::connect(driver, config)?)),
    }
}
