use std::path::PathBuf;
use thiserror::Error;

use crate::resource::{ResourceKind, Status};
use crate::validation::ValidationReport;

/// Failure reported by a remote collaborator (resource service or blob store).
///
/// The core never downgrades these to a lifecycle status; they are
/// propagated so the workflow engine can apply its own retry policy.
#[derive(Debug, Error)]
#[error("{operation} failed: {message}")]
pub struct RemoteError {
    pub operation: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// The main error type for forecast lifecycle operations.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration from {location}: {source}")]
    ConfigParse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration file {location} not found. Upload a configuration document before starting the workflow.")]
    ConfigNotFound { location: String },

    #[error("Invalid configuration document: {message}")]
    InvalidConfigDocument { message: String },

    #[error("configuration item missing key or value for {path} (group '{group}')")]
    MissingConfiguration { path: String, group: String },

    #[error("invalid {path} '{value}' specified for {group}")]
    InvalidDomain {
        path: String,
        group: String,
        value: String,
    },

    #[error("Invalid frequency '{value}' (must be one of Y, M, W, D, H, 30min, 15min, 10min, 5min, 1min)")]
    InvalidFrequency { value: String },

    #[error("Invalid timestamp format '{value}' (must be 'yyyy-MM-dd' or 'yyyy-MM-dd HH:mm:ss')")]
    InvalidTimestampFormat { value: String },

    #[error("Invalid dataset type '{value}'")]
    InvalidDatasetType { value: String },

    #[error("you must configure a TARGET_TIME_SERIES dataset for {artifact}")]
    MissingPrimaryType { artifact: String },

    #[error("duplicate dataset type {data_type} found on {artifact}")]
    DuplicateType { artifact: String, data_type: String },

    #[error("The dataset group domain ({group_domain}) and dataset domain ({dataset_domain}) must match")]
    DomainMismatch {
        group_domain: String,
        dataset_domain: String,
    },

    #[error("Invalid artifact name '{name}': {reason}")]
    InvalidArtifactName { name: String, reason: String },

    #[error("Failed to read artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Remote operation error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Failed to parse step event: {source}")]
    EventParse {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize output: {source}")]
    OutputSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("{kind} {arn} failed with status {status}")]
    ResourceFailed {
        kind: ResourceKind,
        arn: String,
        status: Status,
    },

    #[error("{kind} is not ready yet (status {status})")]
    ResourcePending { kind: ResourceKind, status: Status },
}

impl ForecastError {
    /// Returns true for errors caused by the configuration document itself.
    ///
    /// These are fatal to the current step and never retried.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ForecastError::ConfigParse { .. }
                | ForecastError::InvalidConfigDocument { .. }
                | ForecastError::MissingConfiguration { .. }
                | ForecastError::InvalidDomain { .. }
                | ForecastError::InvalidFrequency { .. }
                | ForecastError::InvalidTimestampFormat { .. }
                | ForecastError::InvalidDatasetType { .. }
                | ForecastError::MissingPrimaryType { .. }
                | ForecastError::DuplicateType { .. }
                | ForecastError::DomainMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_classified() {
        let err = ForecastError::MissingPrimaryType {
            artifact: "RetailDemandTRM.csv".into(),
        };
        assert!(err.is_configuration_error());

        let err = ForecastError::DomainMismatch {
            group_domain: "RETAIL".into(),
            dataset_domain: "CUSTOM".into(),
        };
        assert!(err.is_configuration_error());

        let err = ForecastError::Remote(RemoteError::new("describe", "throttled"));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn missing_configuration_names_the_path() {
        let err = ForecastError::MissingConfiguration {
            path: "Dataset.Domain".into(),
            group: "RetailDemandTRM".into(),
        };
        assert!(err.to_string().contains("Dataset.Domain"));
    }
}
