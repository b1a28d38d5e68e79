//! fluxgate: run SQL against InfluxDB datasources through a Grafana gateway.
//!
//! # Commands
//!
//! - `query`: Execute raw SQL against a datasource and print the rows.
//! - `datasource`: Resolve a datasource uid and show what the gateway knows about it.
//! - `profiles`: List the gateway profiles in the config file.
//!
//! Connection settings come from `~/.fluxgate/config.yaml` (see `--profile`),
//! `FLUXGATE_*` environment variables, and finally command-line flags.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use fluxgate_common::auth::GatewayContext;
use fluxgate_common::config;
use fluxgate_common::telemetry::{self, TracingOptions};
use fluxgate_error::{ErrorCategory, FluxgateError};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use validator::Validate;

mod commands;
mod exit_codes;
mod output;

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "fluxgate", version)]
#[command(about = "Query InfluxDB datasources through a Grafana gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (human, json, yaml)
    #[arg(long, global = true, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Configuration profile
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Gateway base URL, overriding the profile
    #[arg(long, global = true)]
    url: Option<String>,

    /// Gateway API key, overriding the profile
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "fluxgate_connectors=trace")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// OTLP collector endpoint for traces
    #[arg(long, global = true, env = "FLUXGATE_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute raw SQL against an InfluxDB datasource
    Query {
        /// Datasource uid
        #[arg(long, short)]
        datasource: String,
        /// SQL text
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        sql: Option<String>,
        /// Read the SQL text from a file
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
    /// Resolve a datasource uid
    Datasource {
        /// Datasource uid
        uid: String,
    },
    /// List configured profiles
    Profiles,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    telemetry::init_tracing(&TracingOptions {
        default_filter: cli.log_level.clone(),
        json: false,
        otlp_endpoint: cli.otlp_endpoint.clone(),
    })?;

    let outcome = run_cli(&cli).await;
    telemetry::shutdown_tracing();

    if let Err(e) = outcome {
        let exit_code = map_error_to_exit_code(&e);
        if cli.output.is_machine_readable() {
            output::print_error(
                cli.output,
                &format!("{:#}", e),
                exit_code,
                e.downcast_ref::<FluxgateError>(),
            )
            .ok();
        } else {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        std::process::exit(exit_code);
    }

    Ok(())
}

fn map_error_to_exit_code(e: &anyhow::Error) -> i32 {
    if let Some(err) = e.downcast_ref::<FluxgateError>() {
        return match err.category() {
            ErrorCategory::Connection => exit_codes::CONNECTION_ERROR,
            ErrorCategory::Config => exit_codes::CONFIG_ERROR,
            ErrorCategory::Query => exit_codes::QUERY_ERROR,
            ErrorCategory::Auth => exit_codes::PERMISSION_ERROR,
            ErrorCategory::Internal => exit_codes::GENERAL_ERROR,
            _ => exit_codes::GENERAL_ERROR,
        };
    }

    if e.to_string().starts_with("usage:") {
        return exit_codes::USAGE_ERROR;
    }
    exit_codes::GENERAL_ERROR
}

/// Profile from file and environment, then command-line overrides.
fn gateway_context(cli: &Cli) -> Result<GatewayContext> {
    let mut profile = config::load(cli.profile.as_deref())?;

    profile.apply_overrides(|key| match key {
        config::ENV_URL => cli.url.clone(),
        config::ENV_API_KEY => cli.api_key.clone(),
        config::ENV_TIMEOUT_SECS => cli.timeout.map(|t| t.to_string()),
        _ => None,
    })?;
    profile.validate().map_err(FluxgateError::from)?;

    Ok(profile.into_context())
}

async fn run_cli(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Query {
            datasource,
            sql,
            file,
        } => {
            let sql = commands::read_sql(sql.as_deref(), file.as_deref())?;
            let ctx = gateway_context(cli)?;
            commands::query(&ctx, datasource, &sql, cli.output).await?;
        }
        Commands::Datasource { uid } => {
            let ctx = gateway_context(cli)?;
            commands::datasource(&ctx, uid, cli.output).await?;
        }
        Commands::Profiles => {
            commands::profiles(&config::config_path(), cli.output)?;
        }
    }
    Ok(())
}
