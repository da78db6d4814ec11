//! Resource status service abstraction.
//!
//! The [`ForecastService`] trait is the only way the core talks to the
//! remote resource-management API. Implementations are handed to the
//! reconciler explicitly and live for one invocation.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`list_records`](ForecastService::list_records) | Records of a kind whose name starts with a prefix |
//! | [`describe`](ForecastService::describe) | Detailed status and kind-specific metrics |
//! | [`create`](ForecastService::create) | Submit a creation request, returning the new ARN |
//! | [`update`](ForecastService::update) | Update a resource (dataset group membership) |
//!
//! Implementations are expected to reject duplicate creation requests; the
//! core only avoids issuing them by checking status first.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::RemoteError;
use crate::resource::{ResourceKind, Status};

/// One entry returned by a list operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub arn: String,
    pub name: String,
    pub last_modified: DateTime<Utc>,
}

/// Per-field statistics recorded by an import job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStatistics {
    pub count: u64,
}

/// Detailed state of a single resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescription {
    pub arn: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    /// Import jobs only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_statistics: BTreeMap<String, FieldStatistics>,
    /// Dataset groups only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dataset_arns: Vec<String>,
    /// Forecasts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor_arn: Option<String>,
}

impl ResourceDescription {
    pub fn new(arn: impl Into<String>, status: Status) -> Self {
        Self {
            arn: arn.into(),
            status,
            creation_time: None,
            field_statistics: BTreeMap::new(),
            dataset_arns: Vec::new(),
            predictor_arn: None,
        }
    }
}

/// Remote resource-management operations consumed by the core.
pub trait ForecastService {
    /// Lists records of `kind` whose name starts with `name_prefix`, in any order.
    fn list_records(
        &self,
        kind: ResourceKind,
        name_prefix: &str,
    ) -> Result<Vec<ResourceRecord>, RemoteError>;

    fn describe(&self, kind: ResourceKind, arn: &str) -> Result<ResourceDescription, RemoteError>;

    /// Submits a creation request and returns the identifier assigned to it.
    fn create(&self, kind: ResourceKind, params: &Value) -> Result<String, RemoteError>;

    fn update(&self, kind: ResourceKind, arn: &str, params: &Value) -> Result<(), RemoteError>;
}
