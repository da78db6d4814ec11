#![allow(dead_code)]

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use forecast_lifecycle::artifact::FsBlobStore;
use forecast_lifecycle::resource::AccountContext;

pub const BUCKET: &str = "forecast-data";
pub const CONFIG_FIXTURE: &str = include_str!("../fixtures/forecast-defaults.yaml");

pub fn account() -> AccountContext {
    AccountContext::new("us-east-1", "123456789012")
        .with_import_role("arn:aws:iam::123456789012:role/forecast-import")
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Writes a headerless CSV artifact with `records` rows into the bucket.
pub fn write_artifact(root: &Path, key: &str, records: usize) {
    let path = root.join(BUCKET).join(key);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create bucket dir");
    }
    let body: String = (0..records)
        .map(|i| format!("item_{},2020-01-{:02},{}\n", i % 4, i % 28 + 1, i))
        .collect();
    fs::write(path, body).expect("write artifact");
}

/// Uploads the shared configuration fixture into the bucket.
pub fn write_config(root: &Path) {
    let dir = root.join(BUCKET);
    fs::create_dir_all(&dir).expect("create bucket dir");
    fs::write(dir.join("forecast-defaults.yaml"), CONFIG_FIXTURE).expect("write config");
}

pub fn blob_store(root: &Path) -> FsBlobStore {
    FsBlobStore::new(root)
}
