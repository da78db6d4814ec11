use assert_cmd::Command;
use predicates::prelude::*;

const VALID: &str = "tests/fixtures/forecast-defaults.yaml";
const INVALID: &str = "tests/fixtures/invalid.yaml";

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("forecast-lifecycle").unwrap();
    cmd.env_remove("AWS_REGION")
        .env_remove("AWS_ACCOUNT_ID")
        .env_remove("AWS_PARTITION")
        .env_remove("FORECAST_IMPORT_ROLE_ARN");
    cmd
}

#[test]
fn runs() {
    cli().assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = cli();
    cmd.arg("-V");
    cmd.assert()
        .success()
        .stdout(format!("forecast-lifecycle {}\n", env!("CARGO_PKG_VERSION")));
}

// Validate subcommand tests

#[test]
fn validate_valid_config_succeeds() {
    let mut cmd = cli();
    cmd.args(["validate", VALID]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Validation passed"));
}

#[test]
fn validate_invalid_config_fails() {
    let mut cmd = cli();
    cmd.args(["validate", INVALID]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("error(s)"))
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn validate_reports_every_problem() {
    let mut cmd = cli();
    cmd.args(["validate", INVALID]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("GroupNotMapping"))
        .stdout(predicate::str::contains("top level key Broken"))
        .stdout(predicate::str::contains("InvalidParameterValue"))
        .stdout(predicate::str::contains("InvalidParameterType"))
        .stdout(predicate::str::contains("MissingResource"))
        .stdout(predicate::str::contains("UnsupportedResource"))
        .stdout(predicate::str::contains("MissingPrimaryDatasetType"));
}

#[test]
fn validate_json_output_format() {
    let mut cmd = cli();
    cmd.args(["validate", VALID, "--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"error_count\": 0"))
        .stdout(predicate::str::contains("\"warning_count\": 0"));
}

#[test]
fn validate_json_output_lists_issues() {
    let mut cmd = cli();
    cmd.args(["validate", INVALID, "--output", "json"]);
    let output = cmd.assert().failure().get_output().stdout.clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(report["error_count"].as_u64().unwrap() > 0);
    assert!(report["issues"]
        .as_array()
        .unwrap()
        .iter()
        .any(|issue| issue["code"] == "GroupNotMapping" && issue["context"]["name"] == "Broken"));
}

#[test]
fn validate_non_mapping_document() {
    let mut cmd = cli();
    cmd.args(["validate", "tests/fixtures/not_mapping.yaml"]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("TopLevelNotMapping"));
}

#[test]
fn validate_nonexistent_file_fails() {
    let mut cmd = cli();
    cmd.args(["validate", "nonexistent_file.yaml"]);
    cmd.assert().failure();
}

// Resolve subcommand tests

#[test]
fn resolve_prefers_group_override() {
    let mut cmd = cli();
    cmd.args([
        "resolve",
        VALID,
        "RetailDemandTRM.csv",
        "Predictor.ForecastHorizon",
    ]);
    cmd.assert().success().stdout("60\n");
}

#[test]
fn resolve_falls_back_to_default() {
    let mut cmd = cli();
    cmd.args(["resolve", VALID, "Other.csv", "Predictor.ForecastHorizon"]);
    cmd.assert().success().stdout("30\n");
}

#[test]
fn resolve_follows_artifact_data_type() {
    let mut cmd = cli();
    cmd.args([
        "resolve",
        VALID,
        "RetailDemandTRM.related.csv",
        "Dataset.TimestampFormat",
    ]);
    cmd.assert().success().stdout("yyyy-MM-dd HH:mm:ss\n");
}

#[test]
fn resolve_missing_path_names_it() {
    let mut cmd = cli();
    cmd.args(["resolve", VALID, "RetailDemandTRM.csv", "Predictor.Nope"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Predictor.Nope"));
}

#[test]
fn resolve_rejects_bad_artifact_name() {
    let mut cmd = cli();
    cmd.args(["resolve", VALID, "1RetailDemandTRM.csv", "Dataset.Domain"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid artifact name"));
}

// Plan subcommand tests

#[test]
fn plan_lists_all_resources() {
    let mut cmd = cli();
    cmd.args([
        "plan",
        VALID,
        "RetailDemandTRM.csv",
        "--region",
        "eu-west-1",
        "--account-id",
        "111122223333",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "arn:aws:forecast:eu-west-1:111122223333:dataset-group/RetailDemandTRM",
        ))
        .stdout(predicate::str::contains("RetailDemandTRM_related"))
        .stdout(predicate::str::contains("RetailDemandTRM_metadata"))
        .stdout(predicate::str::contains("predictor"))
        .stdout(predicate::str::contains("forecast"));
}

#[test]
fn plan_json_strips_local_keys() {
    let mut cmd = cli();
    cmd.args(["plan", VALID, "RetailDemandTRM.csv", "--output", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let plan: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let resources = plan.as_array().unwrap();

    // group, 3 datasets, 3 import jobs, predictor, forecast
    assert_eq!(resources.len(), 9);

    let predictor = resources
        .iter()
        .find(|r| r["kind"] == "Predictor")
        .unwrap();
    assert!(predictor["request"].get("MaxAge").is_none());
    assert_eq!(predictor["request"]["ForecastHorizon"], 60);

    let related_job = resources
        .iter()
        .find(|r| r["kind"] == "DatasetImportJob" && r["name"] == "RetailDemandTRM_related")
        .unwrap();
    assert_eq!(
        related_job["request"]["DataSource"]["S3Config"]["Path"],
        "s3://forecast-data/RetailDemandTRM.related.csv"
    );
    assert_eq!(related_job["request"]["TimestampFormat"], "yyyy-MM-dd HH:mm:ss");
}

#[test]
fn plan_uses_import_role_from_environment() {
    let mut cmd = cli();
    cmd.env("FORECAST_IMPORT_ROLE_ARN", "arn:aws:iam::111122223333:role/import");
    cmd.args(["plan", VALID, "Other.csv", "--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("arn:aws:iam::111122223333:role/import"));
}
