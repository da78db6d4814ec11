//! Workflow step entry points.
//!
//! The workflow engine invokes one step per resource kind with a
//! [`StepEvent`] and polls it until the step reports a terminal state.
//! Each step is stateless: configuration comes from the event (or storage
//! on the first step), and resource state comes from the remote service.
//!
//! Steps never loop or sleep. A step whose prerequisites are not ready yet
//! returns [`ForecastError::ResourcePending`], which the engine retries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::artifact::{ArtifactDescriptor, BlobStore};
use crate::config::ConfigDocument;
use crate::dependency::DependencyResolver;
use crate::error::ForecastError;
use crate::reconcile::Reconciler;
use crate::resource::{ResourceEntity, ResourceKind, Status};

/// Payload handed to every step by the workflow engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Artifact key within `bucket`.
    pub dataset_file: String,
    pub bucket: String,
    /// Configuration resolved by an earlier step, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl StepEvent {
    pub fn new(dataset_file: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            dataset_file: dataset_file.into(),
            bucket: bucket.into(),
            config: None,
        }
    }

    pub fn from_json(payload: &str) -> Result<Self, ForecastError> {
        serde_json::from_str(payload).map_err(|source| ForecastError::EventParse { source })
    }

    pub fn artifact(&self) -> Result<ArtifactDescriptor, ForecastError> {
        ArtifactDescriptor::new(&self.dataset_file, self.bucket.as_str())
    }

    /// Configuration carried by the event, or loaded from the bucket when
    /// the event does not carry one yet.
    pub fn config(&self, store: &dyn BlobStore) -> Result<ConfigDocument, ForecastError> {
        match &self.config {
            Some(value) => Ok(ConfigDocument::from_value(value.clone())),
            None => ConfigDocument::from_store(store, &self.bucket),
        }
    }

    /// Returns a copy carrying `config`, for threading into later steps.
    pub fn with_config(mut self, config: &ConfigDocument) -> Self {
        self.config = Some(config.as_value().clone());
        self
    }
}

/// Result of one step invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub status: Status,
    pub arn: Option<String>,
}

impl StepOutcome {
    /// Maps the outcome onto the engine's retry contract: ACTIVE succeeds,
    /// a failed state is fatal, anything else is retried.
    pub fn into_result(self, kind: ResourceKind) -> Result<StepOutcome, ForecastError> {
        if self.status == Status::Active {
            Ok(self)
        } else if self.status.is_failed() {
            Err(ForecastError::ResourceFailed {
                kind,
                arn: self.arn.unwrap_or_default(),
                status: self.status,
            })
        } else {
            Err(ForecastError::ResourcePending {
                kind,
                status: self.status,
            })
        }
    }
}

/// Runs the step for `kind`.
pub fn step(
    kind: ResourceKind,
    event: &StepEvent,
    reconciler: &Reconciler<'_>,
) -> Result<StepOutcome, ForecastError> {
    match kind {
        ResourceKind::DatasetGroup => dataset_group_step(event, reconciler),
        ResourceKind::Dataset => dataset_step(event, reconciler),
        ResourceKind::DatasetImportJob => dataset_import_job_step(event, reconciler),
        ResourceKind::Predictor => predictor_step(event, reconciler),
        ResourceKind::Forecast => forecast_step(event, reconciler),
    }
}

/// Creates the dataset group, then adds every ACTIVE dataset once the group
/// is ACTIVE.
///
/// The outcome is the group's own status. Datasets created after this step
/// are added by [`predictor_step`], which also refuses to train until the
/// membership is complete.
pub fn dataset_group_step(
    event: &StepEvent,
    reconciler: &Reconciler<'_>,
) -> Result<StepOutcome, ForecastError> {
    let config = event.config(reconciler.blobs())?;
    let artifact = event.artifact()?;
    let group = config.dataset_group(&artifact)?;

    let (status, arn) = reconciler.reconcile(&ResourceEntity::from(group.clone()))?;
    if status == Status::Active {
        let datasets = config.datasets(&artifact)?;
        reconciler.update_dataset_group(&group, &datasets)?;
    }
    Ok(StepOutcome { status, arn })
}

pub fn dataset_step(
    event: &StepEvent,
    reconciler: &Reconciler<'_>,
) -> Result<StepOutcome, ForecastError> {
    let config = event.config(reconciler.blobs())?;
    let artifact = event.artifact()?;
    config.dataset_group(&artifact)?;

    let dataset = config.dataset(&artifact)?;
    let (status, arn) = reconciler.reconcile(&dataset.into())?;
    Ok(StepOutcome { status, arn })
}

pub fn dataset_import_job_step(
    event: &StepEvent,
    reconciler: &Reconciler<'_>,
) -> Result<StepOutcome, ForecastError> {
    let config = event.config(reconciler.blobs())?;
    let artifact = event.artifact()?;
    config.dataset_group(&artifact)?;

    let job = config.dataset_import_job(&artifact)?;
    let (status, arn) = reconciler.reconcile(&job.into())?;
    Ok(StepOutcome { status, arn })
}

/// Trains a predictor once every required dataset has an ACTIVE import and
/// is a member of the ACTIVE dataset group.
///
/// The dataset group step may finish before its datasets exist, so
/// membership is brought up to date here before training.
pub fn predictor_step(
    event: &StepEvent,
    reconciler: &Reconciler<'_>,
) -> Result<StepOutcome, ForecastError> {
    let config = event.config(reconciler.blobs())?;
    let artifact = event.artifact()?;
    let group = config.dataset_group(&artifact)?;
    let predictor = config.predictor(&artifact)?;

    let group_entity = ResourceEntity::from(group.clone());
    let status = reconciler.status(&group_entity)?;
    if status != Status::Active {
        info!(group = %group.name, %status, "waiting for dataset group");
        let arn = reconciler.arn(&group_entity)?;
        StepOutcome { status, arn }.into_result(ResourceKind::DatasetGroup)?;
    }

    for sibling in DependencyResolver::new(&config).co_dependents(&artifact)? {
        let job = config.dataset_import_job(&sibling)?;
        let status = reconciler.import_job_status(&job)?;
        if status != Status::Active {
            info!(dataset = %job.dataset_name, %status, "waiting for dataset import");
            let arn = reconciler.arn(&job.into())?;
            StepOutcome { status, arn }.into_result(ResourceKind::DatasetImportJob)?;
        }
    }

    let datasets = config.datasets(&artifact)?;
    reconciler.update_dataset_group(&group, &datasets)?;
    let missing = reconciler.missing_members(&group, &datasets)?;
    if !missing.is_empty() {
        info!(group = %group.name, missing = ?missing, "waiting for dataset group membership");
        return Err(ForecastError::ResourcePending {
            kind: ResourceKind::DatasetGroup,
            status: Status::UpdatePending,
        });
    }

    let (status, arn) = reconciler.reconcile(&predictor.into())?;
    Ok(StepOutcome { status, arn })
}

/// Generates a forecast once the current predictor is ACTIVE.
pub fn forecast_step(
    event: &StepEvent,
    reconciler: &Reconciler<'_>,
) -> Result<StepOutcome, ForecastError> {
    let config = event.config(reconciler.blobs())?;
    let artifact = event.artifact()?;
    let forecast = config.forecast(&artifact)?;

    let status = reconciler.predictor_status(&forecast.predictor)?;
    if status != Status::Active {
        info!(predictor = %forecast.predictor.name_prefix, %status, "waiting for predictor");
        let arn = reconciler.arn(&forecast.predictor.clone().into())?;
        StepOutcome { status, arn }.into_result(ResourceKind::Predictor)?;
    }

    let (status, arn) = reconciler.reconcile(&forecast.into())?;
    Ok(StepOutcome { status, arn })
}
