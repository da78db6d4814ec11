//! Dotted-path resolution with fallback to the `Default` group.

use serde_json::Value;

use super::{is_empty, ConfigDocument, DEFAULT_KEY};
use crate::artifact::{ArtifactDescriptor, DatasetType};
use crate::error::ForecastError;

/// Path component that selects the `Datasets` entry for the artifact's data type.
const DATASET_COMPONENT: &str = "Dataset";

impl ConfigDocument {
    /// Resolves a dot-separated path (e.g. `"Dataset.Domain"`) for an artifact.
    ///
    /// The path is walked through the artifact's resource-group section and
    /// through the `Default` section independently. A non-empty value from the
    /// group wins; otherwise the default is used. Mappings are returned whole
    /// from whichever side wins and are never deep-merged.
    ///
    /// A leading `Dataset` component refers to the entry of the section's
    /// `Datasets` list whose `DatasetType` matches the artifact's current type.
    ///
    /// # Errors
    /// [`ForecastError::MissingConfiguration`] if neither side yields a value.
    pub fn resolve(&self, artifact: &ArtifactDescriptor, path: &str) -> Result<Value, ForecastError> {
        self.resolve_ref(artifact, path).cloned()
    }

    pub(crate) fn resolve_ref(
        &self,
        artifact: &ArtifactDescriptor,
        path: &str,
    ) -> Result<&Value, ForecastError> {
        let data_type = artifact.data_type();
        let group = walk(self.group(artifact.prefix()), path, data_type);
        let default = walk(self.group(DEFAULT_KEY), path, data_type);

        group
            .filter(|v| !is_empty(v))
            .or(default.filter(|v| !is_empty(v)))
            .ok_or_else(|| ForecastError::MissingConfiguration {
                path: path.to_string(),
                group: artifact.prefix().to_string(),
            })
    }
}

fn walk<'v>(section: Option<&'v Value>, path: &str, data_type: DatasetType) -> Option<&'v Value> {
    let mut components = path.split('.');
    let first = components.next()?;

    let mut current = child(section?, first, data_type)?;
    for component in components {
        current = current.get(component)?;
    }
    Some(current)
}

fn child<'v>(section: &'v Value, key: &str, data_type: DatasetType) -> Option<&'v Value> {
    if key == DATASET_COMPONENT {
        let entry = section
            .get("Datasets")
            .and_then(Value::as_array)
            .and_then(|datasets| {
                datasets.iter().find(|dataset| {
                    dataset.get("DatasetType").and_then(Value::as_str) == Some(data_type.as_str())
                })
            });
        if entry.is_some() {
            return entry;
        }
    }
    section.get(key)
}
