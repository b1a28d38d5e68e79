//! `query`: run raw SQL against an InfluxDB datasource.

use crate::output::{self, render_table, OutputFormat};
use anyhow::{Context, Result};
use fluxgate_common::auth::GatewayContext;
use fluxgate_connectors::{execute_sql, HttpDatasourceResolver, RowRecord};
use fluxgate_error::FluxgateError;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Serialize)]
struct QueryOutput<'a> {
    datasource: &'a str,
    row_count: usize,
    rows: &'a [RowRecord],
}

/// SQL from `--sql`, or the contents of `--file`.
pub fn read_sql(sql: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (sql, file) {
        (Some(sql), _) => Ok(sql.to_string()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(FluxgateError::from)
            .with_context(|| format!("Failed to read SQL from {}", path.display())),
        (None, None) => anyhow::bail!("usage: either --sql or --file is required"),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub async fn query(
    ctx: &GatewayContext,
    datasource: &str,
    sql: &str,
    format: OutputFormat,
) -> Result<()> {
    let resolver = HttpDatasourceResolver::new(ctx).map_err(FluxgateError::from)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling query");
            interrupt.cancel();
        }
    });

    let progress = (!format.is_machine_readable()).then(|| spinner("Querying..."));
    let result = execute_sql(ctx, &resolver, datasource, sql, &cancel).await;
    watcher.abort();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let rows = result.map_err(FluxgateError::from)?;

    if format.is_machine_readable() {
        output::print_success(
            format,
            QueryOutput {
                datasource,
                row_count: rows.len(),
                rows: &rows,
            },
        )?;
        return Ok(());
    }

    match render_table(&rows, true) {
        Some(table) => print!("{}", table),
        None => println!("{}", "No rows returned.".dimmed()),
    }
    println!("{}", format!("({} rows)", rows.len()).dimmed());
    Ok(())
}
