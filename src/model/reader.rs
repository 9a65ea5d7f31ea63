//! Reader type taxonomy and backend identifiers
//!
//! Every read request names a `ReaderType` that selects between raw
//! samples, interpolation and the aggregate functions. Which types a
//! given backend can serve is decided here, before any SQL is built.

use serde::{Deserialize, Serialize};

use crate::error::HistorianError;

/// Historian backend family
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// AspenTech InfoPlus.21 via the SQLplus dialect
    Aspen,
    /// OSIsoft PI via the PI SQL (piarchive) dialect
    Pi,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Aspen => write!(f, "aspen"),
            Backend::Pi => write!(f, "pi"),
        }
    }
}

/// How values are sampled or aggregated over the requested range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReaderType {
    /// Actual recorded values, no resampling
    Raw,
    /// Downsampled for plotting, shape of the curve preserved
    ShapePreserving,
    /// Interpolated to fixed intervals
    Int,
    /// Minimum per interval
    Min,
    /// Maximum per interval
    Max,
    /// Difference between max and min per interval
    Rng,
    /// Average per interval
    Avg,
    /// Variance per interval
    Var,
    /// Standard deviation per interval
    Std,
    /// Number of raw samples per interval
    Count,
    /// Percentage of good samples per interval
    Good,
    /// Percentage of bad samples per interval
    NotGood,
    /// Totalized value per interval
    Total,
    /// Sum of values per interval
    Sum,
    /// Actual recorded values at the backend's native cadence
    Sampled,
    /// Current value only
    Snapshot,
}

impl ReaderType {
    /// All reader types, for iteration
    pub fn all() -> &'static [ReaderType] {
        &[
            ReaderType::Raw,
            ReaderType::ShapePreserving,
            ReaderType::Int,
            ReaderType::Min,
            ReaderType::Max,
            ReaderType::Rng,
            ReaderType::Avg,
            ReaderType::Var,
            ReaderType::Std,
            ReaderType::Count,
            ReaderType::Good,
            ReaderType::NotGood,
            ReaderType::Total,
            ReaderType::Sum,
            ReaderType::Sampled,
            ReaderType::Snapshot,
        ]
    }

    /// Interval aggregates that PI anchors to the end of each interval
    pub fn is_summary(&self) -> bool {
        matches!(
            self,
            ReaderType::Avg
                | ReaderType::Min
                | ReaderType::Max
                | ReaderType::Rng
                | ReaderType::Std
                | ReaderType::Var
        )
    }

    /// Whether this reader needs a positive sample interval.
    ///
    /// Raw, sampled and snapshot reads take the data at whatever cadence
    /// the backend holds it; everything else resamples by the interval.
    pub fn requires_interval(&self) -> bool {
        !matches!(
            self,
            ReaderType::Raw | ReaderType::Sampled | ReaderType::Snapshot
        )
    }

    /// Whether the given backend can serve this reader type.
    ///
    /// Aspen's aggregates table has no counters or totals, and its
    /// snapshot quality codes use a different numeric schema than the
    /// history status column, so snapshot reads cannot return status.
    pub fn is_valid_for(&self, backend: Backend, with_status: bool) -> bool {
        match backend {
            Backend::Aspen => match self {
                ReaderType::Count
                | ReaderType::Good
                | ReaderType::NotGood
                | ReaderType::Total
                | ReaderType::Sum
                | ReaderType::ShapePreserving => false,
                ReaderType::Snapshot => !with_status,
                _ => true,
            },
            Backend::Pi => true,
        }
    }
}

impl std::fmt::Display for ReaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReaderType::Raw => "RAW",
            ReaderType::ShapePreserving => "SHAPEPRESERVING",
            ReaderType::Int => "INT",
            ReaderType::Min => "MIN",
            ReaderType::Max => "MAX",
            ReaderType::Rng => "RNG",
            ReaderType::Avg => "AVG",
            ReaderType::Var => "VAR",
            ReaderType::Std => "STD",
            ReaderType::Count => "COUNT",
            ReaderType::Good => "GOOD",
            ReaderType::NotGood => "NOTGOOD",
            ReaderType::Total => "TOTAL",
            ReaderType::Sum => "SUM",
            ReaderType::Sampled => "SAMPLED",
            ReaderType::Snapshot => "SNAPSHOT",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for ReaderType {
    type Err = HistorianError;

    /// Parse the conventional spelling, accepting the common synonyms
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RAW" | "ACTUAL" => Ok(ReaderType::Raw),
            "SHAPEPRESERVING" | "BESTFIT" => Ok(ReaderType::ShapePreserving),
            "INT" | "INTERPOLATE" | "INTERPOLATED" => Ok(ReaderType::Int),
            "MIN" | "MINIMUM" => Ok(ReaderType::Min),
            "MAX" | "MAXIMUM" => Ok(ReaderType::Max),
            "RNG" | "RANGE" => Ok(ReaderType::Rng),
            "AVG" | "AVERAGE" | "AVERAGED" => Ok(ReaderType::Avg),
            "VAR" | "VARIANCE" => Ok(ReaderType::Var),
            "STD" | "STDDEV" => Ok(ReaderType::Std),
            "COUNT" => Ok(ReaderType::Count),
            "GOOD" => Ok(ReaderType::Good),
            "NOTGOOD" | "BAD" => Ok(ReaderType::NotGood),
            "TOTAL" => Ok(ReaderType::Total),
            "SUM" => Ok(ReaderType::Sum),
            "SAMPLED" => Ok(ReaderType::Sampled),
            "SNAPSHOT" | "FINAL" | "LAST" => Ok(ReaderType::Snapshot),
            other => Err(HistorianError::InvalidRequest(format!(
                "unknown reader type: {}",
                other
            ))),
        }
    }
}
