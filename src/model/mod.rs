//! Historian data model
//!
//! This module defines the backend-independent request and result types:
//!
//! - **reader**: `ReaderType` taxonomy and `Backend` identifiers
//! - **tag**: Tag identifiers with optional field-mapping selectors
//! - **time**: Time ranges and sample intervals
//! - **request**: `ReadRequest` and per-backend validation
//! - **series**: The canonical normalized time series
//!
//! # Pipeline
//!
//! ```text
//! ReadRequest → validate(backend) → dialect SQL → ResultSet → CanonicalSeries
//! ```

pub mod reader;
pub mod request;
pub mod series;
pub mod tag;
pub mod time;

// Re-export commonly used types
pub use reader::{Backend, ReaderType};
pub use request::ReadRequest;
pub use series::CanonicalSeries;
pub use tag::Tag;
pub use time::{SampleInterval, TimeRange};
