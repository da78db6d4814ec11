//! forecast-lifecycle: control-plane lifecycle management for forecasting resources.
//!
//! A single input artifact (e.g. `RetailDemandTRM.related.csv`) and a
//! hierarchical configuration document determine a family of dependent
//! resources: a dataset group, its datasets, one import job per dataset, a
//! predictor and a forecast. This crate resolves their configuration,
//! computes which of them must exist, and reconciles each one against the
//! remote resource service, one stateless step at a time.
//!
//! # Modules
//!
//! - [`artifact`]: Artifact names, data types and the blob store collaborator
//! - [`config`]: Configuration documents and per-artifact resolution
//! - [`dependency`]: Which datasets a resource group requires
//! - [`resource`]: Resource value types, statuses and ARNs
//! - [`service`]: The remote resource service collaborator
//! - [`reconcile`]: Lifecycle state machine per resource
//! - [`step`]: Workflow step entry points
//! - [`validation`]: Static configuration validation
//! - [`error`]: Error types for forecast lifecycle operations

pub mod artifact;
pub mod config;
pub mod dependency;
pub mod error;
pub mod reconcile;
pub mod resource;
pub mod service;
pub mod step;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;

use artifact::{ArtifactDescriptor, FsBlobStore};
use config::ConfigDocument;
use dependency::DependencyResolver;
use reconcile::Reconciler;
use resource::{AccountContext, ResourceEntity, ResourceKind};
use service::memory::InMemoryForecastService;
use validation::ValidationReport;

pub use error::ForecastError;

/// The forecast-lifecycle CLI application.
#[derive(Parser)]
#[command(name = "forecast-lifecycle")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    account: AccountArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Account settings used to build ARNs.
#[derive(clap::Args)]
struct AccountArgs {
    /// Region the resources live in.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1", global = true)]
    region: String,

    /// Account that owns the resources.
    #[arg(long, env = "AWS_ACCOUNT_ID", default_value = "000000000000", global = true)]
    account_id: String,

    #[arg(long, env = "AWS_PARTITION", default_value = "aws", global = true)]
    partition: String,

    /// Role the import service assumes to read artifacts.
    #[arg(long, env = "FORECAST_IMPORT_ROLE_ARN", global = true)]
    import_role_arn: Option<String>,
}

impl AccountArgs {
    fn context(&self) -> AccountContext {
        let mut account = AccountContext::new(&self.region, &self.account_id);
        account.partition = self.partition.clone();
        account.import_role_arn = self.import_role_arn.clone();
        account
    }
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration document.
    Validate(ValidateArgs),
    /// Resolve one configuration value for an artifact.
    Resolve(ResolveArgs),
    /// Show the resources an artifact needs and the requests that would create them.
    Plan(PlanArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Configuration file to validate.
    config: PathBuf,

    /// Output format for the report.
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,
}

/// Arguments for the resolve subcommand.
#[derive(clap::Args)]
struct ResolveArgs {
    /// Configuration file.
    config: PathBuf,

    /// Artifact key, e.g. `RetailDemandTRM.related.csv`.
    artifact: String,

    /// Dotted configuration path, e.g. `Dataset.Domain`.
    path: String,
}

/// Arguments for the plan subcommand.
#[derive(clap::Args)]
struct PlanArgs {
    /// Configuration file.
    config: PathBuf,

    /// Artifact key, e.g. `RetailDemandTRM.csv`.
    artifact: String,

    /// Bucket the artifact is stored in.
    #[arg(long, default_value = "forecast-data")]
    bucket: String,

    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,
}

/// Run the forecast-lifecycle CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ForecastError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Resolve(args)) => run_resolve(args),
        Some(Commands::Plan(args)) => run_plan(args, &cli.account.context()),
        None => {
            println!("forecast-lifecycle {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Lifecycle management for forecasting resources.");
            println!();
            println!("Run 'forecast-lifecycle --help' for usage information.");
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    error_count: usize,
    warning_count: usize,
    issues: &'a [validation::ValidationIssue],
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), ForecastError> {
    let content = std::fs::read_to_string(&args.config)?;
    let report = validation::validate_yaml(&content, &args.config.display().to_string())?;

    match args.output {
        OutputFormat::Json => {
            let json = JsonReport {
                error_count: report.error_count(),
                warning_count: report.warning_count(),
                issues: &report.issues,
            };
            println!("{}", to_pretty_json(&json)?);
        }
        OutputFormat::Text => print!("{}", report),
    }

    finish_validation(report)
}

fn finish_validation(report: ValidationReport) -> Result<(), ForecastError> {
    if report.is_ok() {
        Ok(())
    } else {
        Err(ForecastError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}

/// Execute the resolve subcommand.
fn run_resolve(args: ResolveArgs) -> Result<(), ForecastError> {
    let config = ConfigDocument::from_path(&args.config)?;
    let artifact = ArtifactDescriptor::new(&args.artifact, "")?;

    match config.resolve(&artifact, &args.path)? {
        Value::String(s) => println!("{}", s),
        other => println!("{}", to_pretty_json(&other)?),
    }
    Ok(())
}

#[derive(Serialize)]
struct PlannedResource {
    kind: ResourceKind,
    name: String,
    arn: Option<String>,
    request: Value,
}

/// Execute the plan subcommand.
///
/// Every resource is reconciled against an empty in-memory service, so the
/// plan shows exactly the creation requests a fresh workflow run submits.
fn run_plan(args: PlanArgs, account: &AccountContext) -> Result<(), ForecastError> {
    let config = ConfigDocument::from_path(&args.config)?;
    let artifact = ArtifactDescriptor::new(&args.artifact, args.bucket.as_str())?;

    let group = config.dataset_group(&artifact)?;
    let mut entities: Vec<ResourceEntity> = vec![group.into()];
    entities.extend(config.datasets(&artifact)?.into_iter().map(ResourceEntity::from));
    for sibling in DependencyResolver::new(&config).co_dependents(&artifact)? {
        entities.push(config.dataset_import_job(&sibling)?.into());
    }
    let forecast = config.forecast(&artifact)?;
    entities.push(forecast.predictor.clone().into());
    entities.push(forecast.into());

    let service = InMemoryForecastService::new(account.clone());
    let blobs = FsBlobStore::new(".");
    let reconciler = Reconciler::new(&service, &blobs, account);

    let mut planned = Vec::with_capacity(entities.len());
    for entity in &entities {
        let (_, arn) = reconciler.reconcile(entity)?;
        let request = service
            .submitted(entity.kind())?
            .pop()
            .unwrap_or(Value::Null);
        planned.push(PlannedResource {
            kind: entity.kind(),
            name: entity.canonical_name().to_string(),
            arn,
            request,
        });
    }

    match args.output {
        OutputFormat::Json => println!("{}", to_pretty_json(&planned)?),
        OutputFormat::Text => {
            for resource in &planned {
                println!(
                    "{:<20} {:<32} {}",
                    resource.kind.to_string(),
                    resource.name,
                    resource.arn.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, ForecastError> {
    serde_json::to_string_pretty(value).map_err(|source| ForecastError::OutputSerialize { source })
}
