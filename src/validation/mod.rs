//! Static validation of configuration documents.
//!
//! Validation never contacts the remote service. Each resource section is
//! checked against the parameter shapes the service enforces on creation,
//! with placeholder names and ARNs standing in for the values the workflow
//! fills in. All problems are accumulated into one [`ValidationReport`].
//!
//! Checks performed:
//! - The document is a mapping with a `Default` group
//! - Every group (except the reserved testing key) is a mapping holding
//!   exactly the resource kinds DatasetGroup, Datasets, Predictor, Forecast
//! - Parameters are known, required ones present, and of the right type
//! - Domains, dataset types and data frequencies are valid literals
//! - A `Datasets` list includes TARGET_TIME_SERIES once and repeats no type

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use serde_json::{Map, Value};

use crate::artifact::{is_valid_prefix, DatasetType};
use crate::config::{value_type_name, ConfigDocument, DEFAULT_KEY, MAX_AGE_KEY, TESTING_KEY};
use crate::dependency::check_dataset_types;
use crate::error::ForecastError;
use crate::resource::{DataFrequency, DatasetDomain};

/// Resource kinds every group must configure.
pub const RESOURCE_KINDS: [&str; 4] = ["DatasetGroup", "Datasets", "Predictor", "Forecast"];

/// Per-dataset key consumed by the import job rather than the dataset.
const TIMESTAMP_FORMAT_KEY: &str = "TimestampFormat";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    String,
    Integer,
    Boolean,
    List,
    Mapping,
}

impl Shape {
    fn matches(self, value: &Value) -> bool {
        match self {
            Shape::String => value.is_string(),
            Shape::Integer => value.is_i64() || value.is_u64(),
            Shape::Boolean => value.is_boolean(),
            Shape::List => value.is_array(),
            Shape::Mapping => value.is_object(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::Integer => "integer",
            Shape::Boolean => "boolean",
            Shape::List => "list",
            Shape::Mapping => "mapping",
        }
    }
}

struct Param {
    name: &'static str,
    shape: Shape,
    required: bool,
}

const fn required(name: &'static str, shape: Shape) -> Param {
    Param {
        name,
        shape,
        required: true,
    }
}

const fn optional(name: &'static str, shape: Shape) -> Param {
    Param {
        name,
        shape,
        required: false,
    }
}

const DATASET_GROUP_PARAMS: &[Param] = &[
    required("Domain", Shape::String),
    optional("DatasetArns", Shape::List),
    optional("Tags", Shape::List),
];

const DATASET_PARAMS: &[Param] = &[
    required("Domain", Shape::String),
    required("DatasetType", Shape::String),
    required("Schema", Shape::Mapping),
    optional("DataFrequency", Shape::String),
    optional("EncryptionConfig", Shape::Mapping),
    optional("Tags", Shape::List),
];

const PREDICTOR_PARAMS: &[Param] = &[
    required("ForecastHorizon", Shape::Integer),
    required("FeaturizationConfig", Shape::Mapping),
    optional("AlgorithmArn", Shape::String),
    optional("ForecastTypes", Shape::List),
    optional("PerformAutoML", Shape::Boolean),
    optional("AutoMLOverrideStrategy", Shape::String),
    optional("PerformHPO", Shape::Boolean),
    optional("TrainingParameters", Shape::Mapping),
    optional("EvaluationParameters", Shape::Mapping),
    optional("HPOConfig", Shape::Mapping),
    optional("InputDataConfig", Shape::Mapping),
    optional("EncryptionConfig", Shape::Mapping),
    optional("OptimizationMetric", Shape::String),
    optional("Tags", Shape::List),
];

const FORECAST_PARAMS: &[Param] = &[
    optional("ForecastTypes", Shape::List),
    optional("Tags", Shape::List),
];

/// Validates a whole configuration document and returns a report of all
/// issues found.
pub fn validate_config(config: &ConfigDocument) -> ValidationReport {
    let mut report = ValidationReport::new();

    let Value::Object(groups) = config.as_value() else {
        report.add(ValidationIssue::error(
            IssueCode::TopLevelNotMapping,
            format!(
                "configuration file must be a mapping but is a {}",
                value_type_name(config.as_value())
            ),
            IssueContext::Document,
        ));
        return report;
    };

    if !groups.contains_key(DEFAULT_KEY) {
        report.add(ValidationIssue::error(
            IssueCode::MissingDefaultSection,
            format!("configuration file should contain a `{}` key", DEFAULT_KEY),
            IssueContext::Document,
        ));
    }

    for (name, section) in groups {
        if name == TESTING_KEY {
            continue;
        }

        let Value::Object(resources) = section else {
            report.add(ValidationIssue::error(
                IssueCode::GroupNotMapping,
                format!("configuration file top level key {} must be a mapping", name),
                IssueContext::group(name),
            ));
            continue;
        };

        if name != DEFAULT_KEY && !is_valid_prefix(name) {
            report.add(ValidationIssue::warning(
                IssueCode::UnreachableGroup,
                format!("no artifact name can select group {}", name),
                IssueContext::group(name),
            ));
        }

        validate_group(name, resources, &mut report);
    }

    report
}

/// Parses YAML and validates it; parse failures surface as errors.
pub fn validate_yaml(content: &str, location: &str) -> Result<ValidationReport, ForecastError> {
    let config = ConfigDocument::parse_yaml(content, location)?;
    Ok(validate_config(&config))
}

fn validate_group(name: &str, resources: &Map<String, Value>, report: &mut ValidationReport) {
    for kind in RESOURCE_KINDS {
        if !resources.contains_key(kind) {
            report.add(ValidationIssue::error(
                IssueCode::MissingResource,
                format!("configuration for {} is missing required resource {}", name, kind),
                IssueContext::group(name),
            ));
        }
    }

    for (resource, section) in resources {
        match resource.as_str() {
            "DatasetGroup" => validate_dataset_group(name, section, report),
            "Datasets" => validate_datasets(name, section, report),
            "Predictor" => validate_predictor(name, section, report),
            "Forecast" => validate_params(name, resource, section, FORECAST_PARAMS, report),
            _ => report.add(ValidationIssue::error(
                IssueCode::UnsupportedResource,
                format!(
                    "{} resource {} is not supported (must be one of {})",
                    name,
                    resource,
                    RESOURCE_KINDS.join(", ")
                ),
                IssueContext::resource(name, resource),
            )),
        }
    }
}

fn validate_dataset_group(group: &str, section: &Value, report: &mut ValidationReport) {
    validate_params(group, "DatasetGroup", section, DATASET_GROUP_PARAMS, report);
    check_domain(group, "DatasetGroup", section, report);
}

fn validate_datasets(group: &str, section: &Value, report: &mut ValidationReport) {
    let Value::Array(datasets) = section else {
        report.add(ValidationIssue::error(
            IssueCode::DatasetsNotList,
            format!("Datasets for {} must be a list", group),
            IssueContext::resource(group, "Datasets"),
        ));
        return;
    };

    let mut types = Vec::with_capacity(datasets.len());
    for (idx, dataset) in datasets.iter().enumerate() {
        let resource = format!("Datasets[{}]", idx);

        let mut dataset = dataset.clone();
        if let Value::Object(map) = &mut dataset {
            map.remove(TIMESTAMP_FORMAT_KEY);
        }
        validate_params(group, &resource, &dataset, DATASET_PARAMS, report);
        check_domain(group, &resource, &dataset, report);

        if let Some(literal) = dataset.get("DatasetType").and_then(Value::as_str) {
            match literal.parse::<DatasetType>() {
                Ok(data_type) => types.push(data_type),
                Err(err) => invalid_value(group, &resource, err, report),
            }
        }
        if let Some(literal) = dataset.get("DataFrequency").and_then(Value::as_str) {
            if let Err(err) = literal.parse::<DataFrequency>() {
                invalid_value(group, &resource, err, report);
            }
        }
    }

    if let Err(err) = check_dataset_types(&types, group) {
        let code = match err {
            ForecastError::MissingPrimaryType { .. } => IssueCode::MissingPrimaryDatasetType,
            _ => IssueCode::DuplicateDatasetType,
        };
        report.add(ValidationIssue::error(
            code,
            format!("configuration issue for {}.Datasets: {}", group, err),
            IssueContext::resource(group, "Datasets"),
        ));
    }
}

fn validate_predictor(group: &str, section: &Value, report: &mut ValidationReport) {
    let mut section = section.clone();
    if let Value::Object(map) = &mut section {
        if let Some(max_age) = map.remove(MAX_AGE_KEY) {
            if !max_age.is_u64() {
                report.add(ValidationIssue::error(
                    IssueCode::InvalidParameterType,
                    format!(
                        "configuration issue for {}.Predictor: {} must be a whole number of seconds",
                        group, MAX_AGE_KEY
                    ),
                    IssueContext::resource(group, "Predictor"),
                ));
            }
        }
    }
    validate_params(group, "Predictor", &section, PREDICTOR_PARAMS, report);
}

fn validate_params(
    group: &str,
    resource: &str,
    section: &Value,
    params: &[Param],
    report: &mut ValidationReport,
) {
    let context = || IssueContext::resource(group, resource);
    let issue = |detail: String| format!("configuration issue for {}.{}: {}", group, resource, detail);

    let Value::Object(map) = section else {
        report.add(ValidationIssue::error(
            IssueCode::InvalidParameterType,
            issue(format!(
                "expected a mapping, found a {}",
                value_type_name(section)
            )),
            context(),
        ));
        return;
    };

    for param in params.iter().filter(|p| p.required) {
        if !map.contains_key(param.name) {
            report.add(ValidationIssue::error(
                IssueCode::MissingParameter,
                issue(format!("missing required parameter {}", param.name)),
                context(),
            ));
        }
    }

    for (key, value) in map {
        match params.iter().find(|p| p.name == key) {
            None => report.add(ValidationIssue::error(
                IssueCode::UnknownParameter,
                issue(format!("unknown parameter {}", key)),
                context(),
            )),
            Some(param) if !param.shape.matches(value) => report.add(ValidationIssue::error(
                IssueCode::InvalidParameterType,
                issue(format!(
                    "parameter {} must be a {}, found a {}",
                    key,
                    param.shape.name(),
                    value_type_name(value)
                )),
                context(),
            )),
            Some(_) => {}
        }
    }
}

fn check_domain(group: &str, resource: &str, section: &Value, report: &mut ValidationReport) {
    let Some(domain) = section.get("Domain").and_then(Value::as_str) else {
        return;
    };
    if DatasetDomain::from_literal(domain).is_none() {
        let allowed: Vec<&str> = DatasetDomain::ALL.iter().map(DatasetDomain::as_str).collect();
        report.add(ValidationIssue::error(
            IssueCode::InvalidParameterValue,
            format!(
                "configuration issue for {}.{}: invalid Domain '{}' (must be one of {})",
                group,
                resource,
                domain,
                allowed.join(", ")
            ),
            IssueContext::resource(group, resource),
        ));
    }
}

fn invalid_value(group: &str, resource: &str, err: ForecastError, report: &mut ValidationReport) {
    report.add(ValidationIssue::error(
        IssueCode::InvalidParameterValue,
        format!("configuration issue for {}.{}: {}", group, resource, err),
        IssueContext::resource(group, resource),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::SAMPLE;
    use serde_json::json;

    fn valid_config() -> Value {
        let mut root: Value = serde_yaml::from_str(SAMPLE).unwrap();
        root.as_object_mut().unwrap().remove("Mismatched");
        root
    }

    fn validate(root: Value) -> ValidationReport {
        validate_config(&ConfigDocument::from_value(root))
    }

    #[test]
    fn test_valid_config() {
        let report = validate(valid_config());
        assert!(report.is_clean(), "unexpected issues: {report}");
    }

    #[test]
    fn test_top_level_scalar_is_reported_not_raised() {
        let mut root = valid_config();
        root["Broken"] = json!("just a string");

        let report = validate(root);
        assert_eq!(report.error_count(), 1);
        assert!(report.errors()[0].contains("Broken"));
        assert!(report.has(IssueCode::GroupNotMapping));
    }

    #[test]
    fn test_document_not_mapping() {
        let report = validate(json!(["a", "b"]));
        assert!(report.has(IssueCode::TopLevelNotMapping));
    }

    #[test]
    fn test_testing_key_is_ignored() {
        let mut root = valid_config();
        root["__Testing__"] = json!(true);
        assert!(validate(root).is_clean());
    }

    #[test]
    fn test_missing_default_section() {
        let mut root = valid_config();
        root.as_object_mut().unwrap().remove("Default");
        assert!(validate(root).has(IssueCode::MissingDefaultSection));
    }

    #[test]
    fn test_missing_and_unsupported_resources() {
        let mut root = valid_config();
        root["Partial"] = json!({ "DatasetGroup": { "Domain": "RETAIL" }, "Widget": {} });

        let report = validate(root);
        let missing = report
            .issues
            .iter()
            .filter(|i| i.code == IssueCode::MissingResource)
            .count();
        assert_eq!(missing, 3);
        assert!(report.has(IssueCode::UnsupportedResource));
    }

    #[test]
    fn test_errors_accumulate_across_groups() {
        let mut root = valid_config();
        root["Default"]["DatasetGroup"]["Domain"] = json!("GROCERIES");
        root["RetailDemandTRM"]["Predictor"]["ForecastHorizon"] = json!("sixty");
        root["RetailDemandTRM"]["Forecast"]["Colour"] = json!("blue");

        let report = validate(root);
        assert_eq!(report.error_count(), 3);
        assert!(report.has(IssueCode::InvalidParameterValue));
        assert!(report.has(IssueCode::InvalidParameterType));
        assert!(report.has(IssueCode::UnknownParameter));
    }

    #[test]
    fn test_local_keys_are_stripped() {
        let mut root = valid_config();
        root["RetailDemandTRM"]["Predictor"]["MaxAge"] = json!("a week");

        let report = validate(root);
        assert_eq!(report.error_count(), 1);
        assert!(report.errors()[0].contains("MaxAge"));
    }

    #[test]
    fn test_datasets_must_be_list() {
        let mut root = valid_config();
        root["RetailDemandTRM"]["Datasets"] = json!({ "DatasetType": "TARGET_TIME_SERIES" });
        assert!(validate(root).has(IssueCode::DatasetsNotList));
    }

    #[test]
    fn test_dataset_literals_are_checked() {
        let mut root = valid_config();
        root["RetailDemandTRM"]["Datasets"][1]["DataFrequency"] = json!("2min");
        root["RetailDemandTRM"]["Datasets"][2]["DatasetType"] = json!("WEATHER");

        let report = validate(root);
        let invalid = report
            .issues
            .iter()
            .filter(|i| i.code == IssueCode::InvalidParameterValue)
            .count();
        assert_eq!(invalid, 2);
    }

    #[test]
    fn test_dataset_type_rules() {
        let mut root = valid_config();
        root["RetailDemandTRM"]["Datasets"][0]["DatasetType"] = json!("RELATED_TIME_SERIES");
        assert!(validate(root).has(IssueCode::MissingPrimaryDatasetType));

        let mut root = valid_config();
        root["RetailDemandTRM"]["Datasets"][2]["DatasetType"] = json!("RELATED_TIME_SERIES");
        assert!(validate(root).has(IssueCode::DuplicateDatasetType));
    }

    #[test]
    fn test_unreachable_group_is_a_warning() {
        let mut root = valid_config();
        root["2020-demand"] = root["RetailDemandTRM"].clone();

        let report = validate(root);
        assert!(report.is_ok());
        assert_eq!(report.warning_count(), 1);
        assert!(report.has(IssueCode::UnreachableGroup));
    }

    #[test]
    fn test_validate_yaml_parse_error() {
        assert!(matches!(
            validate_yaml("Default: [unclosed", "bad.yaml"),
            Err(ForecastError::ConfigParse { .. })
        ));
    }
}
