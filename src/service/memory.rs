//! In-memory [`ForecastService`] implementation for testing and dry runs.
//!
//! Resources live in a `Vec` behind `std::sync::RwLock`. Creation assigns
//! ARNs the way the remote service does and starts every resource in
//! `CREATE_PENDING`; tests drive further transitions with
//! [`InMemoryForecastService::set_status`] and friends.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{FieldStatistics, ForecastService, ResourceDescription, ResourceRecord};
use crate::error::RemoteError;
use crate::resource::{AccountContext, ResourceKind, Status};

struct StoredResource {
    kind: ResourceKind,
    name: String,
    last_modified: DateTime<Utc>,
    description: ResourceDescription,
    params: Value,
}

/// In-memory resource service.
pub struct InMemoryForecastService {
    account: AccountContext,
    now: RwLock<DateTime<Utc>>,
    resources: RwLock<Vec<StoredResource>>,
}

impl InMemoryForecastService {
    pub fn new(account: AccountContext) -> Self {
        Self {
            account,
            now: RwLock::new(Utc::now()),
            resources: RwLock::new(Vec::new()),
        }
    }

    /// Sets the clock used for creation and modification times.
    pub fn set_now(&self, now: DateTime<Utc>) -> Result<(), RemoteError> {
        *self.now.write().map_err(|_| poisoned("set_now"))? = now;
        Ok(())
    }

    /// Inserts a pre-existing resource.
    pub fn seed(
        &self,
        kind: ResourceKind,
        record: ResourceRecord,
        description: ResourceDescription,
    ) -> Result<(), RemoteError> {
        self.write("seed")?.push(StoredResource {
            kind,
            name: record.name,
            last_modified: record.last_modified,
            description,
            params: Value::Null,
        });
        Ok(())
    }

    /// Moves a resource to `status` and bumps its modification time.
    pub fn set_status(&self, arn: &str, status: Status) -> Result<(), RemoteError> {
        let now = self.now()?;
        self.modify("set_status", arn, |resource| {
            resource.description.status = status;
            resource.last_modified = now;
        })
    }

    /// Records field statistics on an import job.
    pub fn set_field_count(&self, arn: &str, field: &str, count: u64) -> Result<(), RemoteError> {
        self.modify("set_field_count", arn, |resource| {
            resource
                .description
                .field_statistics
                .insert(field.to_string(), FieldStatistics { count });
        })
    }

    /// Creation parameters submitted for `kind`, in submission order.
    pub fn submitted(&self, kind: ResourceKind) -> Result<Vec<Value>, RemoteError> {
        Ok(self
            .read("submitted")?
            .iter()
            .filter(|r| r.kind == kind && !r.params.is_null())
            .map(|r| r.params.clone())
            .collect())
    }

    fn now(&self) -> Result<DateTime<Utc>, RemoteError> {
        Ok(*self.now.read().map_err(|_| poisoned("clock"))?)
    }

    fn read(&self, operation: &str) -> Result<RwLockReadGuard<'_, Vec<StoredResource>>, RemoteError> {
        self.resources.read().map_err(|_| poisoned(operation))
    }

    fn write(&self, operation: &str) -> Result<RwLockWriteGuard<'_, Vec<StoredResource>>, RemoteError> {
        self.resources.write().map_err(|_| poisoned(operation))
    }

    fn modify(
        &self,
        operation: &str,
        arn: &str,
        apply: impl FnOnce(&mut StoredResource),
    ) -> Result<(), RemoteError> {
        let mut resources = self.write(operation)?;
        let resource = resources
            .iter_mut()
            .find(|r| r.description.arn == arn)
            .ok_or_else(|| not_found(operation, arn))?;
        apply(resource);
        Ok(())
    }

    fn assign_arn(&self, kind: ResourceKind, name: &str, params: &Value) -> String {
        match kind {
            ResourceKind::DatasetImportJob => {
                let dataset = params
                    .get("DatasetArn")
                    .and_then(Value::as_str)
                    .and_then(|arn| arn.rsplit('/').next())
                    .unwrap_or_default();
                self.account.arn(kind, &format!("{dataset}/{name}"))
            }
            _ => self.account.arn(kind, name),
        }
    }
}

fn name_param(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::DatasetGroup => "DatasetGroupName",
        ResourceKind::Dataset => "DatasetName",
        ResourceKind::DatasetImportJob => "DatasetImportJobName",
        ResourceKind::Predictor => "PredictorName",
        ResourceKind::Forecast => "ForecastName",
    }
}

fn poisoned(operation: &str) -> RemoteError {
    RemoteError::new(operation, "service state lock poisoned")
}

fn not_found(operation: &str, arn: &str) -> RemoteError {
    RemoteError::new(operation, format!("ResourceNotFoundException: {arn}"))
}

impl ForecastService for InMemoryForecastService {
    fn list_records(
        &self,
        kind: ResourceKind,
        name_prefix: &str,
    ) -> Result<Vec<ResourceRecord>, RemoteError> {
        Ok(self
            .read("list")?
            .iter()
            .filter(|r| r.kind == kind && r.name.starts_with(name_prefix))
            .map(|r| ResourceRecord {
                arn: r.description.arn.clone(),
                name: r.name.clone(),
                last_modified: r.last_modified,
            })
            .collect())
    }

    fn describe(&self, kind: ResourceKind, arn: &str) -> Result<ResourceDescription, RemoteError> {
        self.read("describe")?
            .iter()
            .find(|r| r.kind == kind && r.description.arn == arn)
            .map(|r| r.description.clone())
            .ok_or_else(|| not_found("describe", arn))
    }

    fn create(&self, kind: ResourceKind, params: &Value) -> Result<String, RemoteError> {
        let name = params
            .get(name_param(kind))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RemoteError::new("create", format!("missing required parameter {}", name_param(kind)))
            })?
            .to_string();

        let now = self.now()?;
        let arn = self.assign_arn(kind, &name, params);
        let mut resources = self.write("create")?;
        if resources.iter().any(|r| r.kind == kind && r.name == name) {
            return Err(RemoteError::new(
                "create",
                format!("ResourceAlreadyExistsException: {kind} {name}"),
            ));
        }

        let mut description = ResourceDescription::new(arn.clone(), Status::CreatePending);
        description.creation_time = Some(now);
        description.predictor_arn = params
            .get("PredictorArn")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(Value::Array(arns)) = params.get("DatasetArns") {
            description.dataset_arns = arns
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }

        resources.push(StoredResource {
            kind,
            name,
            last_modified: now,
            description,
            params: params.clone(),
        });
        Ok(arn)
    }

    fn update(&self, kind: ResourceKind, arn: &str, params: &Value) -> Result<(), RemoteError> {
        if kind != ResourceKind::DatasetGroup {
            return Err(RemoteError::new("update", format!("{kind} cannot be updated")));
        }
        let dataset_arns: Vec<String> = params
            .get("DatasetArns")
            .and_then(Value::as_array)
            .map(|arns| {
                arns.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let now = self.now()?;
        self.modify("update", arn, |resource| {
            resource.description.dataset_arns = dataset_arns;
            resource.last_modified = now;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> InMemoryForecastService {
        InMemoryForecastService::new(AccountContext::new("us-east-1", "123456789012"))
    }

    #[test]
    fn create_assigns_arn_and_rejects_duplicates() {
        let svc = service();
        let params = json!({ "DatasetGroupName": "Demand", "Domain": "RETAIL" });
        let arn = svc.create(ResourceKind::DatasetGroup, &params).unwrap();
        assert_eq!(
            arn,
            "arn:aws:forecast:us-east-1:123456789012:dataset-group/Demand"
        );
        assert!(svc.create(ResourceKind::DatasetGroup, &params).is_err());

        let desc = svc.describe(ResourceKind::DatasetGroup, &arn).unwrap();
        assert_eq!(desc.status, Status::CreatePending);
    }

    #[test]
    fn import_job_arn_nests_under_dataset() {
        let svc = service();
        let arn = svc
            .create(
                ResourceKind::DatasetImportJob,
                &json!({
                    "DatasetImportJobName": "Demand_2020_01_01_00_00_00",
                    "DatasetArn": "arn:aws:forecast:us-east-1:123456789012:dataset/Demand",
                }),
            )
            .unwrap();
        assert!(arn.ends_with(":dataset-import-job/Demand/Demand_2020_01_01_00_00_00"));
    }

    #[test]
    fn list_filters_by_kind_and_prefix() {
        let svc = service();
        svc.create(ResourceKind::Dataset, &json!({ "DatasetName": "Demand" }))
            .unwrap();
        svc.create(ResourceKind::Dataset, &json!({ "DatasetName": "Other" }))
            .unwrap();
        assert_eq!(svc.list_records(ResourceKind::Dataset, "Dem").unwrap().len(), 1);
        assert!(svc
            .list_records(ResourceKind::DatasetGroup, "Dem")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn describe_unknown_arn_is_an_error() {
        let svc = service();
        assert!(svc.describe(ResourceKind::Predictor, "arn:missing").is_err());
    }
}
