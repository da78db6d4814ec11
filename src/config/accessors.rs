//! Typed projections over [`ConfigDocument::resolve`] and the entity
//! builders that use them.

use serde_json::{Map, Value};
use std::time::Duration;

use super::ConfigDocument;
use crate::artifact::{ArtifactDescriptor, DatasetType};
use crate::dependency::DependencyResolver;
use crate::error::ForecastError;
use crate::resource::{
    DataFrequency, Dataset, DatasetDomain, DatasetGroup, DatasetImportJob, Forecast, Predictor,
    TimestampFormat,
};

/// Predictor key that is interpreted locally and never sent to the service.
pub const MAX_AGE_KEY: &str = "MaxAge";

impl ConfigDocument {
    /// Domain of the artifact's dataset (`Dataset.Domain`).
    pub fn dataset_domain(&self, artifact: &ArtifactDescriptor) -> Result<DatasetDomain, ForecastError> {
        self.domain_at(artifact, "Dataset.Domain")
    }

    /// Domain of the artifact's dataset group (`DatasetGroup.Domain`).
    pub fn dataset_group_domain(
        &self,
        artifact: &ArtifactDescriptor,
    ) -> Result<DatasetDomain, ForecastError> {
        self.domain_at(artifact, "DatasetGroup.Domain")
    }

    fn domain_at(&self, artifact: &ArtifactDescriptor, path: &str) -> Result<DatasetDomain, ForecastError> {
        let value = self.resolve_ref(artifact, path)?;
        value
            .as_str()
            .and_then(DatasetDomain::from_literal)
            .ok_or_else(|| ForecastError::InvalidDomain {
                path: path.to_string(),
                group: artifact.prefix().to_string(),
                value: display_value(value),
            })
    }

    /// Dataset schema, passed through to the service untouched.
    pub fn dataset_schema(&self, artifact: &ArtifactDescriptor) -> Result<Value, ForecastError> {
        self.resolve(artifact, "Dataset.Schema")
    }

    pub fn data_frequency(&self, artifact: &ArtifactDescriptor) -> Result<DataFrequency, ForecastError> {
        let value = self.resolve_ref(artifact, "Dataset.DataFrequency")?;
        match value.as_str() {
            Some(literal) => literal.parse(),
            None => Err(ForecastError::InvalidFrequency {
                value: display_value(value),
            }),
        }
    }

    /// Timestamp format of the artifact; item metadata has none.
    pub fn data_timestamp_format(
        &self,
        artifact: &ArtifactDescriptor,
    ) -> Result<Option<TimestampFormat>, ForecastError> {
        if artifact.data_type() == DatasetType::ItemMetadata {
            return Ok(None);
        }
        let value = self.resolve_ref(artifact, "Dataset.TimestampFormat")?;
        match value.as_str() {
            Some(literal) => literal.parse().map(Some),
            None => Err(ForecastError::InvalidTimestampFormat {
                value: display_value(value),
            }),
        }
    }

    /// The dataset the artifact is imported into.
    pub fn dataset(&self, artifact: &ArtifactDescriptor) -> Result<Dataset, ForecastError> {
        let frequency = match artifact.data_type() {
            DatasetType::ItemMetadata => None,
            _ => Some(self.data_frequency(artifact)?),
        };

        Ok(Dataset {
            name: artifact.dataset_name(),
            dataset_type: artifact.data_type(),
            domain: self.dataset_domain(artifact)?,
            schema: self.dataset_schema(artifact)?,
            frequency,
        })
    }

    /// Every dataset co-dependent with the artifact, in configured order.
    pub fn datasets(&self, artifact: &ArtifactDescriptor) -> Result<Vec<Dataset>, ForecastError> {
        let required = DependencyResolver::new(self).required_dataset_types(artifact)?;

        let mut sibling = artifact.clone();
        let mut datasets = Vec::with_capacity(required.len());
        for data_type in required {
            sibling.set_data_type(data_type);
            datasets.push(self.dataset(&sibling)?);
        }
        Ok(datasets)
    }

    /// The dataset group for the artifact's resource group.
    ///
    /// # Errors
    /// [`ForecastError::DomainMismatch`] if the group's domain differs from the
    /// domain of the artifact's dataset or of any co-dependent dataset.
    pub fn dataset_group(&self, artifact: &ArtifactDescriptor) -> Result<DatasetGroup, ForecastError> {
        let group = DatasetGroup {
            name: artifact.prefix().to_string(),
            domain: self.dataset_group_domain(artifact)?,
        };

        let own = self.dataset(artifact)?;
        let co_dependent = self.datasets(artifact)?;
        for dataset in std::iter::once(&own).chain(co_dependent.iter()) {
            if dataset.domain != group.domain {
                return Err(ForecastError::DomainMismatch {
                    group_domain: group.domain.to_string(),
                    dataset_domain: dataset.domain.to_string(),
                });
            }
        }

        Ok(group)
    }

    pub fn dataset_import_job(
        &self,
        artifact: &ArtifactDescriptor,
    ) -> Result<DatasetImportJob, ForecastError> {
        let dataset = self.dataset(artifact)?;
        Ok(DatasetImportJob {
            artifact: artifact.clone(),
            dataset_name: dataset.name,
            timestamp_format: self.data_timestamp_format(artifact)?,
        })
    }

    pub fn predictor(&self, artifact: &ArtifactDescriptor) -> Result<Predictor, ForecastError> {
        let mut parameters = self.mapping_at(artifact, "Predictor")?;
        let group = self.dataset_group(artifact)?;

        let max_age = match parameters.remove(MAX_AGE_KEY) {
            None => None,
            Some(value) => Some(Duration::from_secs(value.as_u64().ok_or_else(|| {
                ForecastError::InvalidConfigDocument {
                    message: format!(
                        "Predictor.{} for {} must be a whole number of seconds, found {}",
                        MAX_AGE_KEY,
                        artifact.prefix(),
                        display_value(&value)
                    ),
                }
            })?)),
        };

        let dataset_names = DependencyResolver::new(self)
            .co_dependents(artifact)?
            .iter()
            .map(ArtifactDescriptor::dataset_name)
            .collect();

        Ok(Predictor {
            name_prefix: artifact.prefix().to_string(),
            dataset_group_name: group.name,
            dataset_names,
            parameters,
            max_age,
        })
    }

    pub fn forecast(&self, artifact: &ArtifactDescriptor) -> Result<Forecast, ForecastError> {
        let parameters = self.mapping_at(artifact, "Forecast")?;
        let predictor = self.predictor(artifact)?;

        Ok(Forecast {
            name_prefix: artifact.prefix().to_string(),
            predictor,
            parameters,
        })
    }

    fn mapping_at(
        &self,
        artifact: &ArtifactDescriptor,
        path: &str,
    ) -> Result<Map<String, Value>, ForecastError> {
        match self.resolve(artifact, path)? {
            Value::Object(map) => Ok(map),
            other => Err(ForecastError::InvalidConfigDocument {
                message: format!(
                    "{} for {} must be a mapping, found {}",
                    path,
                    artifact.prefix(),
                    display_value(&other)
                ),
            }),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample;
    use serde_json::json;

    fn artifact(name: &str) -> ArtifactDescriptor {
        ArtifactDescriptor::new(name, "bucket").unwrap()
    }

    #[test]
    fn resolves_dataset() {
        let config = sample();
        let dataset = config.dataset(&artifact("RetailDemandTRM.related.csv")).unwrap();
        assert_eq!(dataset.name, "RetailDemandTRM_related");
        assert_eq!(dataset.domain, DatasetDomain::Retail);
        assert_eq!(dataset.frequency, Some(DataFrequency::Hourly));
        assert_eq!(dataset.schema["Attributes"][2]["AttributeName"], "price");
    }

    #[test]
    fn metadata_has_no_frequency_or_timestamp_format() {
        let config = sample();
        let meta = artifact("RetailDemandTRM.metadata.csv");
        assert_eq!(config.dataset(&meta).unwrap().frequency, None);
        assert_eq!(config.data_timestamp_format(&meta).unwrap(), None);
    }

    #[test]
    fn invalid_domain_is_reported() {
        let config = ConfigDocument::from_value(json!({
            "Default": { "DatasetGroup": { "Domain": "GROCERIES" } },
        }));
        let err = config.dataset_group_domain(&artifact("Demand.csv")).unwrap_err();
        match err {
            ForecastError::InvalidDomain { path, value, .. } => {
                assert_eq!(path, "DatasetGroup.Domain");
                assert_eq!(value, "GROCERIES");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_frequency_is_reported() {
        let config = ConfigDocument::from_value(json!({
            "Default": { "Datasets": [
                { "DatasetType": "TARGET_TIME_SERIES", "DataFrequency": "2min" }
            ] },
        }));
        let err = config.data_frequency(&artifact("Demand.csv")).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidFrequency { .. }));
    }

    #[test]
    fn co_dependent_datasets_follow_configuration() {
        let config = sample();
        let datasets = config.datasets(&artifact("RetailDemandTRM.csv")).unwrap();
        let names: Vec<&str> = datasets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["RetailDemandTRM", "RetailDemandTRM_related", "RetailDemandTRM_metadata"]
        );
    }

    #[test]
    fn dataset_group_checks_domains() {
        let config = sample();
        let group = config.dataset_group(&artifact("RetailDemandTRM.csv")).unwrap();
        assert_eq!(group.name, "RetailDemandTRM");
        assert_eq!(group.domain, DatasetDomain::Retail);

        let err = config.dataset_group(&artifact("Mismatched.csv")).unwrap_err();
        match err {
            ForecastError::DomainMismatch {
                group_domain,
                dataset_domain,
            } => {
                assert_eq!(group_domain, "CUSTOM");
                assert_eq!(dataset_domain, "RETAIL");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn predictor_strips_max_age() {
        let config = sample();
        let predictor = config.predictor(&artifact("RetailDemandTRM.csv")).unwrap();
        assert_eq!(predictor.max_age, Some(Duration::from_secs(86400)));
        assert!(!predictor.parameters.contains_key(MAX_AGE_KEY));
        assert_eq!(predictor.parameters["ForecastHorizon"], json!(60));
        assert_eq!(predictor.dataset_names.len(), 3);
    }

    #[test]
    fn predictor_for_default_group_requires_only_target() {
        let config = sample();
        let predictor = config.predictor(&artifact("Unconfigured.csv")).unwrap();
        assert_eq!(predictor.dataset_names, ["Unconfigured"]);
        assert_eq!(predictor.max_age, Some(Duration::from_secs(604800)));
    }

    #[test]
    fn import_job_carries_timestamp_format() {
        let config = sample();
        let job = config
            .dataset_import_job(&artifact("RetailDemandTRM.related.csv"))
            .unwrap();
        assert_eq!(job.dataset_name, "RetailDemandTRM_related");
        assert_eq!(job.timestamp_format, Some(TimestampFormat::DateTime));
    }

    #[test]
    fn forecast_uses_group_parameters() {
        let config = sample();
        let forecast = config.forecast(&artifact("RetailDemandTRM.csv")).unwrap();
        assert_eq!(
            forecast.parameters["ForecastTypes"],
            json!(["0.10", "0.50", "0.90"])
        );
        assert_eq!(forecast.predictor.name_prefix, "RetailDemandTRM");
    }
}
