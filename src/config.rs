//! Source configuration
//!
//! Historian sources are defined in a TOML file, one `[sources.<name>]`
//! block per plant historian. A source names its backend and host; the
//! ODBC connection string is assembled from those fields unless the
//! block carries an explicit override.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::Backend;

/// Conventional SQLplus server port
const ASPEN_DEFAULT_PORT: u16 = 10014;
/// Conventional PI ODBC gateway port
const PI_DEFAULT_PORT: u16 = 5450;

/// Main configuration structure: named historian sources
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
}

/// One historian source definition
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Which dialect the source speaks
    pub backend: Backend,

    /// Historian host name
    pub host: String,

    /// Server port, when it differs from the backend's default
    pub port: Option<u16>,

    /// Row cap for raw reads
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// PI Data Access Server, when it differs from the host
    pub das_server: Option<String>,

    /// Explicit ODBC connection string, overriding the assembled one
    pub connection_string: Option<String>,
}

fn default_max_rows() -> usize {
    100_000
}

impl SourceConfig {
    /// A source definition with backend defaults for everything but the
    /// host
    pub fn new(backend: Backend, host: impl Into<String>) -> Self {
        Self {
            backend,
            host: host.into(),
            port: None,
            max_rows: default_max_rows(),
            das_server: None,
            connection_string: None,
        }
    }

    /// Effective port: the configured one or the backend's default
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(match self.backend {
            Backend::Aspen => ASPEN_DEFAULT_PORT,
            Backend::Pi => PI_DEFAULT_PORT,
        })
    }

    /// ODBC connection string for this source.
    ///
    /// The PI gateway connects through a Data Access Server; when none
    /// is configured the historian host itself is assumed to serve that
    /// role.
    pub fn connection_string(&self) -> String {
        if let Some(explicit) = &self.connection_string {
            return explicit.clone();
        }
        match self.backend {
            Backend::Aspen => format!(
                "DRIVER={{AspenTech SQLPlus}};HOST={};PORT={};READONLY=Y;MAXROWS={}",
                self.host,
                self.port(),
                self.max_rows
            ),
            Backend::Pi => format!(
                "DRIVER={{PI ODBC Driver}};Server={};\
                 Trusted_Connection=Yes;Command Timeout=1800;Provider Type=PIOLEDB;\
                 Provider String={{Data source={};Integrated_Security=SSPI;Time Zone=UTC}};",
                self.das_server.as_deref().unwrap_or(&self.host),
                self.host
            ),
        }
    }
}

impl Config {
    /// Look up a source by name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.get(name)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load from default locations
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("historian").join("sources.toml")),
            Some(PathBuf::from("/etc/historian/sources.toml")),
            Some(PathBuf::from("./sources.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!("Loaded sources from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load sources from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("No source file found, starting with an empty source list");
        Self::default()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Historian source definitions
#
# Each [sources.<name>] block defines one historian. The connection
# string is assembled from the fields below; set connection_string to
# override it entirely.

[sources.plant-ip21]
backend = "aspen"
host = "aspenhost.example.com"

# SQLplus port, defaults to 10014
# port = 10014

# Row cap for raw reads
max_rows = 100000

[sources.plant-pi]
backend = "pi"
host = "pihost.example.com"

# PI Data Access Server, defaults to the host
# das_server = "pigateway.example.com"

# [sources.custom]
# backend = "pi"
# host = "pihost.example.com"
# connection_string = "DRIVER={PI ODBC Driver};..."
"#
    .to_string()
}
