#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use forecast_lifecycle::artifact::DatasetType;
use forecast_lifecycle::service::ResourceRecord;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::{json, Value};

pub const FREQUENCIES: [&str; 10] = [
    "Y", "M", "W", "D", "H", "30min", "15min", "10min", "5min", "1min",
];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Resource-group prefixes that artifact names can select.
pub fn arb_prefix() -> BoxedStrategy<String> {
    "[A-Za-z][A-Za-z0-9_]{0,15}"
        .prop_filter("reserved group", |p| p != "Default")
        .boxed()
}

pub fn arb_dataset_type() -> BoxedStrategy<DatasetType> {
    prop::sample::select(DatasetType::ALL.to_vec()).boxed()
}

/// History records whose timestamps come from a small pool, so ties occur.
pub fn arb_records(max_len: usize) -> BoxedStrategy<Vec<ResourceRecord>> {
    prop::collection::vec((0u32..6, 0u32..1000), 1..=max_len)
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(day, id)| ResourceRecord {
                    arn: format!("arn:aws:forecast:us-east-1:123456789012:predictor/p_{id:04}"),
                    name: format!("p_{id:04}"),
                    last_modified: day_of_2020(day),
                })
                .collect()
        })
        .boxed()
}

pub fn day_of_2020(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, day + 1, 0, 0, 0).unwrap()
}

pub fn dataset_entry(data_type: DatasetType) -> Value {
    json!({
        "Domain": "RETAIL",
        "DatasetType": data_type.as_str(),
        "DataFrequency": "D",
        "TimestampFormat": "yyyy-MM-dd",
        "Schema": { "Attributes": [] },
    })
}

/// A document whose `Default` lists every dataset type and whose `group`
/// overrides `Datasets` with `types` (or not at all when `None`).
pub fn config_with_override(group: &str, types: Option<&[DatasetType]>) -> Value {
    let mut root = json!({
        "Default": {
            "DatasetGroup": { "Domain": "RETAIL" },
            "Datasets": DatasetType::ALL.iter().map(|t| dataset_entry(*t)).collect::<Vec<_>>(),
        },
    });
    let datasets = types.map(|types| types.iter().map(|t| dataset_entry(*t)).collect::<Vec<_>>());
    root[group] = match datasets {
        Some(datasets) => json!({ "Datasets": datasets }),
        None => json!({ "DatasetGroup": { "Domain": "RETAIL" } }),
    };
    root
}
