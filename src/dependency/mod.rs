//! Co-dependent dataset resolution.
//!
//! A resource group that does not customize its `Datasets` list needs only
//! the primary time series before a predictor can be trained, so training
//! can start while auxiliary datasets are still being configured. As soon
//! as a group overrides `Datasets`, that list is authoritative and is
//! validated strictly.

use serde_json::Value;
use std::collections::HashSet;

use crate::artifact::{ArtifactDescriptor, DatasetType};
use crate::config::ConfigDocument;
use crate::error::ForecastError;

/// Computes which datasets must exist for an artifact's resource group.
#[derive(Clone, Copy, Debug)]
pub struct DependencyResolver<'a> {
    config: &'a ConfigDocument,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(config: &'a ConfigDocument) -> Self {
        Self { config }
    }

    /// Dataset types that must exist for the artifact's resource group, in
    /// configured order.
    ///
    /// # Errors
    /// - [`ForecastError::MissingConfiguration`] if no `Datasets` are configured at all
    /// - [`ForecastError::MissingPrimaryType`] if an override lacks `TARGET_TIME_SERIES`
    /// - [`ForecastError::DuplicateType`] if an override repeats a type
    pub fn required_dataset_types(
        &self,
        artifact: &ArtifactDescriptor,
    ) -> Result<Vec<DatasetType>, ForecastError> {
        let datasets = self.config.resolve_ref(artifact, "Datasets")?;
        let defaults = self
            .config
            .default_section()
            .and_then(|section| section.get("Datasets"));

        if defaults == Some(datasets) {
            return Ok(vec![DatasetType::PRIMARY]);
        }

        let entries = datasets
            .as_array()
            .ok_or_else(|| ForecastError::InvalidConfigDocument {
                message: format!("Datasets for {} must be a list", artifact.prefix()),
            })?;

        let types = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| match entry.get("DatasetType").and_then(Value::as_str) {
                Some(literal) => literal.parse::<DatasetType>(),
                None => Err(ForecastError::MissingConfiguration {
                    path: format!("Datasets[{idx}].DatasetType"),
                    group: artifact.prefix().to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        check_dataset_types(&types, &artifact.name())?;
        Ok(types)
    }

    /// One artifact descriptor per required dataset type, sharing the
    /// artifact's prefix and location.
    pub fn co_dependents(
        &self,
        artifact: &ArtifactDescriptor,
    ) -> Result<Vec<ArtifactDescriptor>, ForecastError> {
        Ok(self
            .required_dataset_types(artifact)?
            .into_iter()
            .map(|data_type| artifact.with_data_type(data_type))
            .collect())
    }
}

/// Checks a configured dataset type list: the primary type must be present
/// and no type may repeat.
pub fn check_dataset_types(types: &[DatasetType], artifact: &str) -> Result<(), ForecastError> {
    if !types.contains(&DatasetType::PRIMARY) {
        return Err(ForecastError::MissingPrimaryType {
            artifact: artifact.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for data_type in types {
        if !seen.insert(*data_type) {
            return Err(ForecastError::DuplicateType {
                artifact: artifact.to_string(),
                data_type: data_type.to_string(),
            });
        }
    }
    Ok(())
}

impl ConfigDocument {
    /// Shorthand for [`DependencyResolver::required_dataset_types`].
    pub fn required_dataset_types(
        &self,
        artifact: &ArtifactDescriptor,
    ) -> Result<Vec<DatasetType>, ForecastError> {
        DependencyResolver::new(self).required_dataset_types(artifact)
    }
}
