//! Input artifacts that drive resource creation.
//!
//! An artifact is a delimited data file dropped into a storage location.
//! Its file name encodes both the resource-group prefix and the dataset
//! type it carries:
//!
//! | File name                      | Prefix            | Dataset type          |
//! |--------------------------------|-------------------|-----------------------|
//! | `RetailDemandTRM.csv`          | `RetailDemandTRM` | `TARGET_TIME_SERIES`  |
//! | `RetailDemandTRM.related.csv`  | `RetailDemandTRM` | `RELATED_TIME_SERIES` |
//! | `RetailDemandTRM.metadata.csv` | `RetailDemandTRM` | `ITEM_METADATA`       |

mod store;

pub use store::{BlobStore, FsBlobStore};

use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;

use crate::error::ForecastError;

/// The kind of data an artifact (and the dataset built from it) carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetType {
    /// The primary time series; every resource group requires exactly one.
    TargetTimeSeries,
    RelatedTimeSeries,
    ItemMetadata,
}

impl DatasetType {
    pub const ALL: [DatasetType; 3] = [
        DatasetType::TargetTimeSeries,
        DatasetType::RelatedTimeSeries,
        DatasetType::ItemMetadata,
    ];

    /// The mandatory dataset type.
    pub const PRIMARY: DatasetType = DatasetType::TargetTimeSeries;

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetType::TargetTimeSeries => "TARGET_TIME_SERIES",
            DatasetType::RelatedTimeSeries => "RELATED_TIME_SERIES",
            DatasetType::ItemMetadata => "ITEM_METADATA",
        }
    }

    /// File-name suffix (before `.csv`) used by artifacts of this type.
    fn file_suffix(&self) -> &'static str {
        match self {
            DatasetType::TargetTimeSeries => ".csv",
            DatasetType::RelatedTimeSeries => ".related.csv",
            DatasetType::ItemMetadata => ".metadata.csv",
        }
    }

    /// Suffix appended to the prefix to form the dataset name.
    fn name_suffix(&self) -> &'static str {
        match self {
            DatasetType::TargetTimeSeries => "",
            DatasetType::RelatedTimeSeries => "_related",
            DatasetType::ItemMetadata => "_metadata",
        }
    }
}

impl FromStr for DatasetType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ForecastError::InvalidDatasetType {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes one input artifact for the duration of a single invocation.
///
/// Size and record count are fetched lazily from a [`BlobStore`] and cached.
/// The data type is the only mutable field: it is switched while walking the
/// co-dependent datasets of the same resource group, which also rewrites the
/// name and key to the sibling artifact for that type.
#[derive(Clone, Debug)]
pub struct ArtifactDescriptor {
    location: String,
    directory: String,
    prefix: String,
    data_type: DatasetType,
    size_bytes: OnceCell<u64>,
    record_count: OnceCell<u64>,
}

impl ArtifactDescriptor {
    /// Parses an artifact key (optionally with directories) within a storage location.
    pub fn new(key: &str, location: impl Into<String>) -> Result<Self, ForecastError> {
        let (directory, name) = match key.rfind('/') {
            Some(idx) => (&key[..=idx], &key[idx + 1..]),
            None => ("", key),
        };

        if directory.starts_with('/') || directory.split('/').any(|part| part == "..") {
            return Err(ForecastError::InvalidArtifactName {
                name: key.to_string(),
                reason: "key must stay within its storage location".to_string(),
            });
        }
        let (prefix, data_type) = parse_name(name)?;

        Ok(Self {
            location: location.into(),
            directory: directory.to_string(),
            prefix: prefix.to_string(),
            data_type,
            size_bytes: OnceCell::new(),
            record_count: OnceCell::new(),
        })
    }

    /// The storage location (bucket or directory) holding the artifact.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The artifact file name, e.g. `RetailDemandTRM.related.csv`.
    pub fn name(&self) -> String {
        format!("{}{}", self.prefix, self.data_type.file_suffix())
    }

    /// The full key of the artifact within its location.
    pub fn key(&self) -> String {
        format!("{}{}", self.directory, self.name())
    }

    /// The resource-group prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn data_type(&self) -> DatasetType {
        self.data_type
    }

    /// Switches to the sibling artifact of another dataset type.
    pub fn set_data_type(&mut self, data_type: DatasetType) {
        if self.data_type != data_type {
            self.data_type = data_type;
            self.size_bytes = OnceCell::new();
            self.record_count = OnceCell::new();
        }
    }

    /// Returns a copy describing the sibling artifact of `data_type`.
    pub fn with_data_type(&self, data_type: DatasetType) -> Self {
        let mut other = self.clone();
        other.set_data_type(data_type);
        other
    }

    /// Canonical dataset name for the current data type.
    pub fn dataset_name(&self) -> String {
        format!("{}{}", self.prefix, self.data_type.name_suffix())
    }

    /// URI of the artifact as handed to the import service.
    pub fn source_uri(&self) -> String {
        format!("s3://{}/{}", self.location, self.key())
    }

    /// Size of the artifact in bytes.
    pub fn size_bytes(&self, store: &dyn BlobStore) -> Result<u64, ForecastError> {
        if let Some(size) = self.size_bytes.get() {
            return Ok(*size);
        }
        let size = store.object_size(&self.location, &self.key())?;
        Ok(*self.size_bytes.get_or_init(|| size))
    }

    /// Number of records in the artifact.
    pub fn record_count(&self, store: &dyn BlobStore) -> Result<u64, ForecastError> {
        if let Some(count) = self.record_count.get() {
            return Ok(*count);
        }
        let count = store.record_count(&self.location, &self.key())?;
        Ok(*self.record_count.get_or_init(|| count))
    }
}

fn parse_name(name: &str) -> Result<(&str, DatasetType), ForecastError> {
    let invalid = |reason: &str| ForecastError::InvalidArtifactName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    // longest suffix first so `.related.csv` is not read as a `.csv` prefix
    let (prefix, data_type) = [
        DatasetType::RelatedTimeSeries,
        DatasetType::ItemMetadata,
        DatasetType::TargetTimeSeries,
    ]
    .iter()
    .find_map(|t| name.strip_suffix(t.file_suffix()).map(|p| (p, *t)))
    .ok_or_else(|| invalid("expected a .csv, .related.csv or .metadata.csv file"))?;

    check_prefix(prefix).map_err(invalid)?;
    Ok((prefix, data_type))
}

fn check_prefix(prefix: &str) -> Result<(), &'static str> {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        Some(_) => return Err("prefix must start with a letter"),
        None => return Err("prefix is empty"),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("prefix may only contain ASCII letters, digits and underscores");
    }
    Ok(())
}

/// Fuzz-only entrypoint for artifact key parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_key(key: &str) -> Result<(), ForecastError> {
    let artifact = ArtifactDescriptor::new(key, "<fuzz>")?;
    let _ = artifact.dataset_name();
    let _ = artifact.source_uri();
    Ok(())
}

/// True if some artifact name can map to a resource group called `prefix`.
pub fn is_valid_prefix(prefix: &str) -> bool {
    check_prefix(prefix).is_ok()
}
