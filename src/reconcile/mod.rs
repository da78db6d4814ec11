//! Per-resource lifecycle reconciliation.
//!
//! A [`Reconciler`] answers three questions for any [`ResourceEntity`]:
//! what state is it in, what is its ARN, and how is it created. It holds
//! no state between calls; every answer is re-derived from the remote
//! service and the blob store.
//!
//! # Naming
//!
//! Dataset groups and datasets have deterministic names, so their ARNs
//! follow from the account context. Import jobs, predictors and forecasts
//! are created with a timestamp suffix (`<base>_YYYY_MM_DD_HH_MM_SS`) and
//! are found again by selecting the most recent generation with
//! [`select_latest`].
//!
//! # Locally synthesized states
//!
//! The remote service may report `ACTIVE` for a resource that no longer
//! reflects its inputs. In these cases [`Status::DoesNotExist`] is reported
//! instead, which makes the caller create a new generation:
//!
//! - an import job whose recorded `item_id` count differs from the
//!   artifact's current record count
//! - a predictor older than its `MaxAge`, or older than the latest import
//!   job of any dataset it trains on
//! - a forecast generated from a predictor that is no longer the latest

use chrono::{DateTime, NaiveDateTime, Utc};
use std::cmp::Ordering;
use tracing::{debug, info};

use crate::artifact::BlobStore;
use crate::error::ForecastError;
use crate::resource::{
    timestamped_name, AccountContext, Dataset, DatasetGroup, DatasetImportJob, Forecast, Predictor,
    ResourceEntity, ResourceKind, Status,
};
use crate::service::{ForecastService, ResourceRecord};

const GENERATION_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Picks the most recent record: greatest `last_modified`, ties broken by
/// the lexically greatest ARN. The result does not depend on input order.
pub fn select_latest<I>(records: I) -> Option<ResourceRecord>
where
    I: IntoIterator<Item = ResourceRecord>,
{
    records.into_iter().max_by(compare_records)
}

fn compare_records(a: &ResourceRecord, b: &ResourceRecord) -> Ordering {
    a.last_modified
        .cmp(&b.last_modified)
        .then_with(|| a.arn.cmp(&b.arn))
}

/// True if `name` is `base` followed by `_` and a creation timestamp.
fn is_generation_of(name: &str, base: &str) -> bool {
    name.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|stamp| NaiveDateTime::parse_from_str(stamp, GENERATION_FORMAT).is_ok())
}

/// Lifecycle state machine bound to one invocation's collaborators.
pub struct Reconciler<'a> {
    service: &'a dyn ForecastService,
    blobs: &'a dyn BlobStore,
    account: &'a AccountContext,
    now: DateTime<Utc>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        service: &'a dyn ForecastService,
        blobs: &'a dyn BlobStore,
        account: &'a AccountContext,
    ) -> Self {
        Self {
            service,
            blobs,
            account,
            now: Utc::now(),
        }
    }

    /// Uses `now` for generation names and age checks instead of the wall clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn blobs(&self) -> &'a dyn BlobStore {
        self.blobs
    }

    pub fn account(&self) -> &'a AccountContext {
        self.account
    }

    /// Current lifecycle state of `entity`.
    pub fn status(&self, entity: &ResourceEntity) -> Result<Status, ForecastError> {
        match entity {
            ResourceEntity::DatasetGroup(group) => {
                self.named_status(ResourceKind::DatasetGroup, &group.name)
            }
            ResourceEntity::Dataset(dataset) => {
                self.named_status(ResourceKind::Dataset, &dataset.name)
            }
            ResourceEntity::DatasetImportJob(job) => self.import_job_status(job),
            ResourceEntity::Predictor(predictor) => self.predictor_status(predictor),
            ResourceEntity::Forecast(forecast) => self.forecast_status(forecast),
        }
    }

    /// ARN of `entity`, if it is known.
    ///
    /// Deterministic kinds always have one; history-style kinds only once a
    /// generation exists.
    pub fn arn(&self, entity: &ResourceEntity) -> Result<Option<String>, ForecastError> {
        let kind = entity.kind();
        if kind.is_history_style() {
            Ok(self
                .latest_generation(kind, entity.canonical_name())?
                .map(|record| record.arn))
        } else {
            Ok(Some(self.account.arn(kind, entity.canonical_name())))
        }
    }

    /// Submits a creation request for `entity` and returns the new ARN.
    ///
    /// Callers check [`status`](Self::status) first; duplicate requests are
    /// left to the remote service to reject.
    pub fn create(&self, entity: &ResourceEntity) -> Result<String, ForecastError> {
        let kind = entity.kind();
        let params = match entity {
            ResourceEntity::DatasetGroup(group) => group.create_params(),
            ResourceEntity::Dataset(dataset) => dataset.create_params(),
            ResourceEntity::DatasetImportJob(job) => job.create_params(
                &timestamped_name(job.name_prefix(), self.now),
                &self.account.arn(ResourceKind::Dataset, &job.dataset_name),
                self.account.import_role_arn.as_deref(),
            ),
            ResourceEntity::Predictor(predictor) => predictor.create_params(
                &timestamped_name(&predictor.name_prefix, self.now),
                &self
                    .account
                    .arn(ResourceKind::DatasetGroup, &predictor.dataset_group_name),
            ),
            ResourceEntity::Forecast(forecast) => {
                let predictor = self
                    .latest_generation(ResourceKind::Predictor, &forecast.predictor.name_prefix)?
                    .ok_or(ForecastError::ResourcePending {
                        kind: ResourceKind::Predictor,
                        status: Status::DoesNotExist,
                    })?;
                forecast.create_params(
                    &timestamped_name(&forecast.name_prefix, self.now),
                    &predictor.arn,
                )
            }
        };

        let arn = self.service.create(kind, &params)?;
        info!(%kind, %arn, "submitted create request");
        Ok(arn)
    }

    /// Creates `entity` if it does not exist, then reports its state and ARN.
    pub fn reconcile(
        &self,
        entity: &ResourceEntity,
    ) -> Result<(Status, Option<String>), ForecastError> {
        let mut status = self.status(entity)?;
        if status == Status::DoesNotExist {
            self.create(entity)?;
            status = self.status(entity)?;
        }
        Ok((status, self.arn(entity)?))
    }

    /// Adds every ACTIVE dataset in `datasets` to the group's membership.
    ///
    /// Does nothing unless the group is ACTIVE. Returns whether an update
    /// was submitted; the update is sent even when membership is already
    /// complete. Datasets that are not ACTIVE yet are left out and show up
    /// in [`missing_members`](Self::missing_members).
    pub fn update_dataset_group(
        &self,
        group: &DatasetGroup,
        datasets: &[Dataset],
    ) -> Result<bool, ForecastError> {
        let status = self.named_status(ResourceKind::DatasetGroup, &group.name)?;
        if status != Status::Active {
            debug!(group = %group.name, %status, "dataset group not active, skipping update");
            return Ok(false);
        }

        let group_arn = self.account.arn(ResourceKind::DatasetGroup, &group.name);
        let mut members = self
            .service
            .describe(ResourceKind::DatasetGroup, &group_arn)?
            .dataset_arns;

        for dataset in datasets {
            if self.named_status(ResourceKind::Dataset, &dataset.name)? != Status::Active {
                continue;
            }
            let arn = self.account.arn(ResourceKind::Dataset, &dataset.name);
            if !members.contains(&arn) {
                members.push(arn);
            }
        }

        self.service.update(
            ResourceKind::DatasetGroup,
            &group_arn,
            &DatasetGroup::update_params(&members),
        )?;
        info!(group = %group.name, members = members.len(), "updated dataset group membership");
        Ok(true)
    }

    /// ARNs of `datasets` that are not members of the group yet.
    ///
    /// Every dataset is missing while the group itself does not exist.
    pub fn missing_members(
        &self,
        group: &DatasetGroup,
        datasets: &[Dataset],
    ) -> Result<Vec<String>, ForecastError> {
        let required = datasets
            .iter()
            .map(|dataset| self.account.arn(ResourceKind::Dataset, &dataset.name));

        let members = match self.named_status(ResourceKind::DatasetGroup, &group.name)? {
            Status::DoesNotExist => Vec::new(),
            _ => {
                let group_arn = self.account.arn(ResourceKind::DatasetGroup, &group.name);
                self.service
                    .describe(ResourceKind::DatasetGroup, &group_arn)?
                    .dataset_arns
            }
        };
        Ok(required.filter(|arn| !members.contains(arn)).collect())
    }

    /// Status of the most recent import job, with content drift detection.
    pub fn import_job_status(&self, job: &DatasetImportJob) -> Result<Status, ForecastError> {
        let Some(latest) = self.latest_generation(ResourceKind::DatasetImportJob, job.name_prefix())?
        else {
            return Ok(Status::DoesNotExist);
        };

        let description = self
            .service
            .describe(ResourceKind::DatasetImportJob, &latest.arn)?;
        if description.status != Status::Active {
            return Ok(description.status);
        }

        let expected = job.artifact.record_count(self.blobs)?;
        let imported = description
            .field_statistics
            .get(DatasetImportJob::PRIMARY_FIELD)
            .map(|stats| stats.count);

        if imported == Some(expected) {
            Ok(Status::Active)
        } else {
            info!(
                job = %latest.name,
                artifact = %job.artifact.key(),
                expected,
                imported = ?imported,
                "artifact record count changed since last import"
            );
            Ok(Status::DoesNotExist)
        }
    }

    /// Status of the most recent predictor, reporting a stale one as absent.
    pub fn predictor_status(&self, predictor: &Predictor) -> Result<Status, ForecastError> {
        let Some(latest) = self.latest_generation(ResourceKind::Predictor, &predictor.name_prefix)?
        else {
            return Ok(Status::DoesNotExist);
        };

        let description = self.service.describe(ResourceKind::Predictor, &latest.arn)?;
        if description.status != Status::Active {
            return Ok(description.status);
        }

        let created = description.creation_time.unwrap_or(latest.last_modified);
        if let Some(max_age) = predictor.max_age {
            let age = self.now.signed_duration_since(created);
            if age.to_std().is_ok_and(|age| age > max_age) {
                info!(
                    predictor = %latest.name,
                    max_age_secs = max_age.as_secs(),
                    "predictor exceeded its maximum age"
                );
                return Ok(Status::DoesNotExist);
            }
        }

        for dataset_name in &predictor.dataset_names {
            let Some(job) = self.latest_generation(ResourceKind::DatasetImportJob, dataset_name)?
            else {
                continue;
            };
            if job.last_modified > created {
                info!(
                    predictor = %latest.name,
                    job = %job.name,
                    "dataset was re-imported after predictor training"
                );
                return Ok(Status::DoesNotExist);
            }
        }

        Ok(Status::Active)
    }

    /// Status of the most recent forecast, reporting one built from a
    /// superseded predictor as absent. A forecast whose description does
    /// not name its predictor is taken as current.
    pub fn forecast_status(&self, forecast: &Forecast) -> Result<Status, ForecastError> {
        let Some(latest) = self.latest_generation(ResourceKind::Forecast, &forecast.name_prefix)?
        else {
            return Ok(Status::DoesNotExist);
        };

        let description = self.service.describe(ResourceKind::Forecast, &latest.arn)?;
        if description.status != Status::Active {
            return Ok(description.status);
        }

        let Some(used) = description.predictor_arn else {
            debug!(forecast = %latest.name, "forecast does not name its predictor");
            return Ok(Status::Active);
        };
        let current = self
            .latest_generation(ResourceKind::Predictor, &forecast.predictor.name_prefix)?;
        if current.is_some_and(|record| record.arn != used) {
            info!(
                forecast = %latest.name,
                "forecast was generated from a superseded predictor"
            );
            return Ok(Status::DoesNotExist);
        }

        Ok(Status::Active)
    }

    fn named_status(&self, kind: ResourceKind, name: &str) -> Result<Status, ForecastError> {
        let record = self
            .service
            .list_records(kind, name)?
            .into_iter()
            .find(|record| record.name == name);

        let status = match record {
            Some(record) => self.service.describe(kind, &record.arn)?.status,
            None => Status::DoesNotExist,
        };
        debug!(%kind, name, %status, "resolved status");
        Ok(status)
    }

    fn latest_generation(
        &self,
        kind: ResourceKind,
        base: &str,
    ) -> Result<Option<ResourceRecord>, ForecastError> {
        let records = self.service.list_records(kind, base)?;
        let latest = select_latest(
            records
                .into_iter()
                .filter(|record| is_generation_of(&record.name, base)),
        );
        debug!(%kind, base, latest = ?latest.as_ref().map(|r| &r.name), "selected latest generation");
        Ok(latest)
    }
}
