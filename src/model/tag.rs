//! Tag identifiers
//!
//! Historian tags are addressed by name, optionally qualified with a
//! field-mapping selector in the `name;mapping` form used by IP.21
//! (e.g. `ATCAI;IP_AnalogMap`). The selector is split off once, here,
//! so the rest of the crate never re-parses tag strings.

use serde::{Deserialize, Serialize};

/// A tag name with an optional field-mapping selector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Bare tag name as known by the backend
    pub name: String,
    /// Mapping selector from the `name;mapping` form, if present
    pub mapping: Option<String>,
}

impl Tag {
    /// Parse a tag string, splitting off the mapping selector if present.
    ///
    /// An empty selector (`"tag;"`) is treated as no selector.
    pub fn new(tag: impl AsRef<str>) -> Self {
        let tag = tag.as_ref();
        match tag.split_once(';') {
            Some((name, mapping)) => {
                let mapping = mapping.trim();
                Self {
                    name: name.to_string(),
                    mapping: (!mapping.is_empty()).then(|| mapping.to_string()),
                }
            }
            None => Self {
                name: tag.to_string(),
                mapping: None,
            },
        }
    }

    /// Build a tag with an explicit mapping selector
    pub fn with_mapping(name: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mapping: Some(mapping.into()),
        }
    }

    /// Column name for this tag's status series
    pub fn status_column(&self) -> String {
        format!("{}::status", self)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.mapping {
            Some(mapping) => write!(f, "{};{}", self.name, mapping),
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Tag::new(tag)
    }
}
