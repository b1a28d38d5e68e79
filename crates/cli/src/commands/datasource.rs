//! `datasource`: resolve a uid without querying it.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use fluxgate_common::auth::GatewayContext;
use fluxgate_connectors::{DatasourceResolver, HttpDatasourceResolver, QueryError};
use fluxgate_error::FluxgateError;
use owo_colors::OwoColorize;

pub async fn datasource(ctx: &GatewayContext, uid: &str, format: OutputFormat) -> Result<()> {
    let resolver = HttpDatasourceResolver::new(ctx).map_err(FluxgateError::from)?;

    let found = resolver
        .resolve(uid)
        .await
        .map_err(|source| FluxgateError::from(QueryError::Resolution {
            uid: uid.to_string(),
            source,
        }))?
        .ok_or_else(|| FluxgateError::from(QueryError::DatasourceNotFound {
            uid: uid.to_string(),
        }))?;

    if format.is_machine_readable() {
        output::print_success(format, &found)?;
        return Ok(());
    }

    println!("{} {}", "UID: ".bold(), found.uid);
    println!("{} {}", "Name:".bold(), found.name);
    println!("{} {}", "Type:".bold(), found.kind.cyan());
    Ok(())
}
