//! Account and region context used to derive resource identifiers.

use super::status::ResourceKind;

/// Identifies the account a run manages resources in.
///
/// Scoped to one invocation; passed explicitly wherever ARNs are derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountContext {
    pub partition: String,
    pub region: String,
    pub account_id: String,
    /// Role the import service assumes to read artifacts.
    pub import_role_arn: Option<String>,
}

impl AccountContext {
    pub fn new(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            partition: "aws".to_string(),
            region: region.into(),
            account_id: account_id.into(),
            import_role_arn: None,
        }
    }

    pub fn with_import_role(mut self, role_arn: impl Into<String>) -> Self {
        self.import_role_arn = Some(role_arn.into());
        self
    }

    /// Deterministic ARN for a resource of `kind` named `name`.
    ///
    /// Only meaningful for kinds whose remote name equals their canonical
    /// name; history-style kinds must be looked up instead.
    pub fn arn(&self, kind: ResourceKind, name: &str) -> String {
        format!(
            "arn:{}:forecast:{}:{}:{}/{}",
            self.partition,
            self.region,
            self.account_id,
            kind.arn_segment(),
            name
        )
    }
}
