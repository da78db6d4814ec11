//! Lifecycle states shared by every managed resource.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The lifecycle status of a managed resource.
///
/// `DoesNotExist` is also synthesized locally when an existing resource is
/// stale (content drift, expired predictor) and must be recreated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    DoesNotExist,
    Active,
    CreatePending,
    CreateInProgress,
    CreateFailed,
    DeletePending,
    DeleteInProgress,
    DeleteFailed,
    UpdatePending,
    UpdateInProgress,
    UpdateFailed,
}

impl Status {
    /// All statuses, in declaration order.
    pub const ALL: [Status; 11] = [
        Status::DoesNotExist,
        Status::Active,
        Status::CreatePending,
        Status::CreateInProgress,
        Status::CreateFailed,
        Status::DeletePending,
        Status::DeleteInProgress,
        Status::DeleteFailed,
        Status::UpdatePending,
        Status::UpdateInProgress,
        Status::UpdateFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::DoesNotExist => "DOES_NOT_EXIST",
            Status::Active => "ACTIVE",
            Status::CreatePending => "CREATE_PENDING",
            Status::CreateInProgress => "CREATE_IN_PROGRESS",
            Status::CreateFailed => "CREATE_FAILED",
            Status::DeletePending => "DELETE_PENDING",
            Status::DeleteInProgress => "DELETE_IN_PROGRESS",
            Status::DeleteFailed => "DELETE_FAILED",
            Status::UpdatePending => "UPDATE_PENDING",
            Status::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Status::UpdateFailed => "UPDATE_FAILED",
        }
    }

    /// Returns true for any `*_FAILED` status.
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            Status::CreateFailed | Status::DeleteFailed | Status::UpdateFailed
        )
    }

    /// Returns true when polling can stop (ACTIVE or a failure).
    pub fn is_terminal(&self) -> bool {
        *self == Status::Active || self.is_failed()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown resource status '{s}'"))
    }
}

/// The kinds of managed resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    DatasetGroup,
    Dataset,
    DatasetImportJob,
    Predictor,
    Forecast,
}

impl ResourceKind {
    /// Resource-type segment used in ARNs.
    pub fn arn_segment(&self) -> &'static str {
        match self {
            ResourceKind::DatasetGroup => "dataset-group",
            ResourceKind::Dataset => "dataset",
            ResourceKind::DatasetImportJob => "dataset-import-job",
            ResourceKind::Predictor => "predictor",
            ResourceKind::Forecast => "forecast",
        }
    }

    /// Kinds whose remote name carries a creation timestamp suffix, so the
    /// ARN must be discovered from the record history.
    pub fn is_history_style(&self) -> bool {
        matches!(
            self,
            ResourceKind::DatasetImportJob | ResourceKind::Predictor | ResourceKind::Forecast
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::DatasetGroup => "dataset group",
            ResourceKind::Dataset => "dataset",
            ResourceKind::DatasetImportJob => "dataset import job",
            ResourceKind::Predictor => "predictor",
            ResourceKind::Forecast => "forecast",
        };
        f.write_str(name)
    }
}
