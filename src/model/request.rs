//! Read requests and per-backend validation
//!
//! A `ReadRequest` is backend-independent. `validate` checks it against
//! a concrete backend before any SQL is built, so unsupported or
//! malformed requests never reach a connection.

use serde::{Deserialize, Serialize};

use crate::error::{HistorianError, Result};
use crate::model::reader::{Backend, ReaderType};
use crate::model::tag::Tag;
use crate::model::time::{SampleInterval, TimeRange};

/// One read of one tag over one time range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadRequest {
    /// Tag to read, with optional mapping selector
    pub tag: Tag,
    /// Sampling or aggregation mode
    pub reader: ReaderType,
    /// Time range; open-ended only for snapshot reads
    pub range: TimeRange,
    /// Sample interval for interpolated and aggregated reads
    #[serde(default)]
    pub interval: SampleInterval,
    /// Also return the quality/status column
    #[serde(default)]
    pub include_status: bool,
}

impl ReadRequest {
    /// Create a request with no interval and no status column
    pub fn new(tag: impl Into<Tag>, reader: ReaderType, range: TimeRange) -> Self {
        Self {
            tag: tag.into(),
            reader,
            range,
            interval: SampleInterval::zero(),
            include_status: false,
        }
    }

    /// Builder method: set the sample interval
    pub fn interval(mut self, interval: SampleInterval) -> Self {
        self.interval = interval;
        self
    }

    /// Builder method: request the status column
    pub fn with_status(mut self) -> Self {
        self.include_status = true;
        self
    }

    /// Check this request against a backend's capabilities.
    ///
    /// Runs before any query is built; a request that fails here never
    /// touches the connection.
    pub fn validate(&self, backend: Backend) -> Result<()> {
        if backend == Backend::Aspen {
            if matches!(
                self.reader,
                ReaderType::Count
                    | ReaderType::Good
                    | ReaderType::NotGood
                    | ReaderType::Total
                    | ReaderType::Sum
                    | ReaderType::ShapePreserving
            ) {
                return Err(HistorianError::Unsupported(format!(
                    "{} is not supported on {}",
                    self.reader, backend
                )));
            }

            if self.reader == ReaderType::Snapshot && self.include_status {
                return Err(HistorianError::Unsupported(
                    "SNAPSHOT with status is not supported on aspen".to_string(),
                ));
            }
        }

        if self.reader == ReaderType::Snapshot {
            if self.range.stop.is_some() {
                return Err(HistorianError::InvalidRequest(
                    "SNAPSHOT reads the current value and does not accept a stop time"
                        .to_string(),
                ));
            }
        } else if self.range.stop.is_none() {
            return Err(HistorianError::InvalidRequest(format!(
                "a stop time is required for {}",
                self.reader
            )));
        }

        if self.reader.requires_interval() && self.interval.whole_seconds() <= 0 {
            return Err(HistorianError::InvalidRequest(format!(
                "a positive sample interval is required for {}",
                self.reader
            )));
        }

        Ok(())
    }
}
