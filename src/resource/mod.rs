//! Managed resource model.
//!
//! Resource kinds are a closed set, so they are modelled as a sum type
//! ([`ResourceEntity`]) sharing one lifecycle enumeration ([`Status`]).
//! Entities are plain values built from resolved configuration; their remote
//! state is never cached here and is re-derived by the reconciler on every
//! invocation.

mod arn;
mod domain;
mod entity;
mod status;

pub use arn::AccountContext;
pub use domain::{DataFrequency, DatasetDomain, TimestampFormat};
pub use entity::{
    timestamped_name, Dataset, DatasetGroup, DatasetImportJob, Forecast, Predictor,
    ResourceEntity,
};
pub use status::{ResourceKind, Status};
