//! Hierarchical forecast configuration.
//!
//! A configuration document maps resource-group names (artifact prefixes) to
//! per-kind parameter blocks, with a reserved `Default` group used as the
//! fallback for anything a group does not override:
//!
//! ```yaml
//! Default:
//!   DatasetGroup:
//!     Domain: RETAIL
//!   Datasets:
//!     - Domain: RETAIL
//!       DatasetType: TARGET_TIME_SERIES
//!       DataFrequency: D
//!       TimestampFormat: yyyy-MM-dd
//!       Schema:
//!         Attributes: [...]
//!   Predictor:
//!     ForecastHorizon: 30
//!     ...
//!   Forecast:
//!     ForecastTypes: ["0.50"]
//! RetailDemandTRM:
//!   Predictor:
//!     ForecastHorizon: 60
//! ```
//!
//! The document is immutable once loaded; every lookup is a pure function
//! over it (see [`ConfigDocument::resolve`]).

mod accessors;
mod resolve;

pub use accessors::MAX_AGE_KEY;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::artifact::BlobStore;
use crate::error::ForecastError;

/// Name of the fallback resource group.
pub const DEFAULT_KEY: &str = "Default";

/// Reserved top-level key ignored by validation.
pub const TESTING_KEY: &str = "__Testing__";

/// Object key the configuration document is stored under.
pub const DEFAULT_CONFIG_KEY: &str = "forecast-defaults.yaml";

/// A loaded configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    /// Wraps an already-resolved document (e.g. threaded through a step event).
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Parses YAML without any structural checks.
    ///
    /// Used by validation, which reports structural problems instead of
    /// failing on them.
    pub fn parse_yaml(content: &str, location: &str) -> Result<Self, ForecastError> {
        let root: Value =
            serde_yaml::from_str(content).map_err(|source| ForecastError::ConfigParse {
                location: location.to_string(),
                source,
            })?;
        Ok(Self { root })
    }

    /// Parses YAML and checks it is a mapping with a `Default` section.
    pub fn from_yaml_str(content: &str, location: &str) -> Result<Self, ForecastError> {
        let document = Self::parse_yaml(content, location)?;

        let Value::Object(map) = &document.root else {
            return Err(ForecastError::InvalidConfigDocument {
                message: format!(
                    "{} should contain a YAML mapping but is a {}",
                    location,
                    value_type_name(&document.root)
                ),
            });
        };

        if map.get(DEFAULT_KEY).is_none_or(is_empty) {
            return Err(ForecastError::InvalidConfigDocument {
                message: format!("{} should contain a `{}` key", location, DEFAULT_KEY),
            });
        }

        Ok(document)
    }

    /// Reads a configuration document from a local file.
    pub fn from_path(path: &Path) -> Result<Self, ForecastError> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ForecastError::ConfigNotFound {
                    location: path.display().to_string(),
                }
            } else {
                ForecastError::Io(err)
            }
        })?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Loads the configuration document stored in `location`.
    pub fn from_store(store: &dyn BlobStore, location: &str) -> Result<Self, ForecastError> {
        let uri = format!("s3://{}/{}", location, DEFAULT_CONFIG_KEY);
        let content = store
            .read_object(location, DEFAULT_CONFIG_KEY)?
            .ok_or_else(|| ForecastError::ConfigNotFound {
                location: uri.clone(),
            })?;
        Self::from_yaml_str(&content, &uri)
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Section of a resource group, if present.
    pub fn group(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    /// The `Default` section, if present.
    pub fn default_section(&self) -> Option<&Value> {
        self.group(DEFAULT_KEY)
    }
}

/// A configured value counts as absent when it is null or an empty string,
/// mapping or sequence.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
