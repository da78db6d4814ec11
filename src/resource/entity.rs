//! Typed value objects for each managed resource kind.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::domain::{DataFrequency, DatasetDomain, TimestampFormat};
use super::status::ResourceKind;
use crate::artifact::{ArtifactDescriptor, DatasetType};

/// Appends the creation timestamp that history-style resources carry in their names.
pub fn timestamped_name(base: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", base, now.format("%Y_%m_%d_%H_%M_%S"))
}

/// A dataset group: the container a predictor trains against.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetGroup {
    pub name: String,
    pub domain: DatasetDomain,
}

impl DatasetGroup {
    pub fn create_params(&self) -> Value {
        json!({
            "DatasetGroupName": self.name,
            "Domain": self.domain.as_str(),
        })
    }

    pub fn update_params(dataset_arns: &[String]) -> Value {
        json!({ "DatasetArns": dataset_arns })
    }
}

/// A dataset of one type within a resource group.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub dataset_type: DatasetType,
    pub domain: DatasetDomain,
    pub schema: Value,
    /// Absent for item metadata.
    pub frequency: Option<DataFrequency>,
}

impl Dataset {
    pub fn create_params(&self) -> Value {
        let mut params = json!({
            "DatasetName": self.name,
            "Domain": self.domain.as_str(),
            "DatasetType": self.dataset_type.as_str(),
            "Schema": self.schema,
        });
        if let Some(frequency) = self.frequency {
            params["DataFrequency"] = json!(frequency.as_str());
        }
        params
    }
}

/// An import of one artifact into its dataset.
#[derive(Clone, Debug)]
pub struct DatasetImportJob {
    pub artifact: ArtifactDescriptor,
    pub dataset_name: String,
    /// Absent for item metadata.
    pub timestamp_format: Option<TimestampFormat>,
}

impl DatasetImportJob {
    /// Field whose recorded count is compared against the artifact's record count.
    pub const PRIMARY_FIELD: &'static str = "item_id";

    /// Job names start with the dataset name followed by `_`.
    pub fn name_prefix(&self) -> &str {
        &self.dataset_name
    }

    pub fn create_params(
        &self,
        job_name: &str,
        dataset_arn: &str,
        role_arn: Option<&str>,
    ) -> Value {
        let mut s3_config = json!({ "Path": self.artifact.source_uri() });
        if let Some(role_arn) = role_arn {
            s3_config["RoleArn"] = json!(role_arn);
        }
        let mut params = json!({
            "DatasetImportJobName": job_name,
            "DatasetArn": dataset_arn,
            "DataSource": { "S3Config": s3_config },
        });
        if let Some(format) = self.timestamp_format {
            params["TimestampFormat"] = json!(format.as_str());
        }
        params
    }
}

/// A predictor trained on a dataset group.
#[derive(Clone, Debug, PartialEq)]
pub struct Predictor {
    pub name_prefix: String,
    pub dataset_group_name: String,
    /// Names of the datasets whose imports the predictor was trained on.
    pub dataset_names: Vec<String>,
    /// Creation parameters from configuration, without local-only keys.
    pub parameters: Map<String, Value>,
    /// Retrain once the current predictor is older than this.
    pub max_age: Option<Duration>,
}

impl Predictor {
    pub fn create_params(&self, predictor_name: &str, dataset_group_arn: &str) -> Value {
        let mut params = self.parameters.clone();
        params.insert("PredictorName".into(), json!(predictor_name));

        let mut input = match params.remove("InputDataConfig") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        input.insert("DatasetGroupArn".into(), json!(dataset_group_arn));
        params.insert("InputDataConfig".into(), Value::Object(input));

        Value::Object(params)
    }
}

/// A forecast generated from the current predictor.
#[derive(Clone, Debug, PartialEq)]
pub struct Forecast {
    pub name_prefix: String,
    pub predictor: Predictor,
    pub parameters: Map<String, Value>,
}

impl Forecast {
    pub fn create_params(&self, forecast_name: &str, predictor_arn: &str) -> Value {
        let mut params = self.parameters.clone();
        params.insert("ForecastName".into(), json!(forecast_name));
        params.insert("PredictorArn".into(), json!(predictor_arn));
        Value::Object(params)
    }
}

/// Any managed resource.
#[derive(Clone, Debug)]
pub enum ResourceEntity {
    DatasetGroup(DatasetGroup),
    Dataset(Dataset),
    DatasetImportJob(DatasetImportJob),
    Predictor(Predictor),
    Forecast(Forecast),
}

impl ResourceEntity {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceEntity::DatasetGroup(_) => ResourceKind::DatasetGroup,
            ResourceEntity::Dataset(_) => ResourceKind::Dataset,
            ResourceEntity::DatasetImportJob(_) => ResourceKind::DatasetImportJob,
            ResourceEntity::Predictor(_) => ResourceKind::Predictor,
            ResourceEntity::Forecast(_) => ResourceKind::Forecast,
        }
    }

    /// Canonical name: the full remote name, or for history-style kinds the
    /// prefix shared by every generation of the resource.
    pub fn canonical_name(&self) -> &str {
        match self {
            ResourceEntity::DatasetGroup(group) => &group.name,
            ResourceEntity::Dataset(dataset) => &dataset.name,
            ResourceEntity::DatasetImportJob(job) => job.name_prefix(),
            ResourceEntity::Predictor(predictor) => &predictor.name_prefix,
            ResourceEntity::Forecast(forecast) => &forecast.name_prefix,
        }
    }
}

impl From<DatasetGroup> for ResourceEntity {
    fn from(value: DatasetGroup) -> Self {
        ResourceEntity::DatasetGroup(value)
    }
}

impl From<Dataset> for ResourceEntity {
    fn from(value: Dataset) -> Self {
        ResourceEntity::Dataset(value)
    }
}

impl From<DatasetImportJob> for ResourceEntity {
    fn from(value: DatasetImportJob) -> Self {
        ResourceEntity::DatasetImportJob(value)
    }
}

impl From<Predictor> for ResourceEntity {
    fn from(value: Predictor) -> Self {
        ResourceEntity::Predictor(value)
    }
}

impl From<Forecast> for ResourceEntity {
    fn from(value: Forecast) -> Self {
        ResourceEntity::Forecast(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamped_names() {
        let now = Utc.with_ymd_and_hms(2017, 1, 1, 8, 30, 5).unwrap();
        assert_eq!(
            timestamped_name("RetailDemandTRM", now),
            "RetailDemandTRM_2017_01_01_08_30_05"
        );
    }

    #[test]
    fn predictor_params_inject_dataset_group() {
        let mut parameters = Map::new();
        parameters.insert("ForecastHorizon".into(), json!(30));
        parameters.insert(
            "InputDataConfig".into(),
            json!({ "SupplementaryFeatures": [{ "Name": "holiday", "Value": "US" }] }),
        );
        let predictor = Predictor {
            name_prefix: "Demand".into(),
            dataset_group_name: "Demand".into(),
            dataset_names: vec!["Demand".into()],
            parameters,
            max_age: None,
        };

        let params = predictor.create_params("Demand_2020_01_01_00_00_00", "arn:dsg");
        assert_eq!(params["PredictorName"], "Demand_2020_01_01_00_00_00");
        assert_eq!(params["ForecastHorizon"], 30);
        assert_eq!(params["InputDataConfig"]["DatasetGroupArn"], "arn:dsg");
        assert_eq!(
            params["InputDataConfig"]["SupplementaryFeatures"][0]["Name"],
            "holiday"
        );
    }

    #[test]
    fn metadata_dataset_has_no_frequency() {
        let dataset = Dataset {
            name: "Demand_metadata".into(),
            dataset_type: DatasetType::ItemMetadata,
            domain: DatasetDomain::Retail,
            schema: json!({ "Attributes": [] }),
            frequency: None,
        };
        let params = dataset.create_params();
        assert!(params.get("DataFrequency").is_none());
        assert_eq!(params["DatasetType"], "ITEM_METADATA");
    }
}
