//! Validation report types for structured error reporting.
//!
//! A report accumulates every issue found in a configuration document so a
//! single run surfaces all problems at once. Reports can be displayed to
//! users, serialized as JSON, or processed programmatically.

use serde::Serialize;
use std::fmt;

/// The result of validating a configuration document.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Human-readable messages of every error, in discovery order.
    pub fn errors(&self) -> Vec<String> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.message.clone())
            .collect()
    }

    /// Returns true if any issue carries `code`.
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    pub message: String,

    /// Where in the document the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but usable configuration.
    Warning,
    /// Configuration the workflow would reject.
    Error,
}

/// A stable code identifying the type of validation issue.
///
/// These codes can be used for filtering, ignoring specific issues,
/// or programmatic handling of validation results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // Document structure
    /// The document root is not a mapping.
    TopLevelNotMapping,
    /// The document has no `Default` group.
    MissingDefaultSection,
    /// A resource group's value is not a mapping.
    GroupNotMapping,
    /// A group name no artifact prefix can match.
    UnreachableGroup,

    // Resource groups
    /// A group lacks one of DatasetGroup, Datasets, Predictor, Forecast.
    MissingResource,
    /// A group contains a key that is not a resource kind.
    UnsupportedResource,
    /// `Datasets` is not a list.
    DatasetsNotList,

    // Resource parameters
    /// A required parameter is absent.
    MissingParameter,
    /// A parameter the service does not accept.
    UnknownParameter,
    /// A parameter has the wrong type.
    InvalidParameterType,
    /// A parameter is outside its enumeration.
    InvalidParameterValue,

    // Dataset type list
    /// An overridden `Datasets` list lacks TARGET_TIME_SERIES.
    MissingPrimaryDatasetType,
    /// An overridden `Datasets` list repeats a type.
    DuplicateDatasetType,
}

/// Where in the document a validation issue occurred.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum IssueContext {
    /// The document as a whole.
    Document,
    /// A resource group.
    Group { name: String },
    /// One resource section within a group.
    Resource { group: String, resource: String },
}

impl IssueContext {
    pub fn group(name: &str) -> Self {
        IssueContext::Group {
            name: name.to_string(),
        }
    }

    pub fn resource(group: &str, resource: &str) -> Self {
        IssueContext::Resource {
            group: group.to_string(),
            resource: resource.to_string(),
        }
    }
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Document => write!(f, "document"),
            IssueContext::Group { name } => write!(f, "group {}", name),
            IssueContext::Resource { group, resource } => write!(f, "{}.{}", group, resource),
        }
    }
}
