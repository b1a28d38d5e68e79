//! Raw SQL against InfluxDB datasources behind the gateway.
//!
//! A query is resolved, wrapped in a query envelope, posted to
//! `/api/ds/query?ds_type=influxdb`, and the reply's first frame is turned
//! into one JSON object per row:
//!
//! ```text
//! uid, sql ──▶ resolve ──▶ envelope ──▶ POST ──▶ decode ──▶ rows
//! ```
//!
//! Each call is independent: nothing is cached between calls and no error is
//! retried.
use crate::sources::gateway_auth::AuthenticatedTransport;
use crate::sources::{Datasource, DatasourceResolver};
use fluxgate_common::auth::GatewayContext;
use fluxgate_common::scrubber::redact_sql;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use validator::Validate;

pub mod decode;
pub mod envelope;
pub mod error;
pub mod frames;
pub mod rows;

pub use envelope::{QueryEnvelope, DATASOURCE_TYPE};
pub use error::{DecodeStage, ErrorKind, QueryError};
pub use rows::RowRecord;

pub const QUERY_PATH: &str = "/api/ds/query?ds_type=influxdb";

pub const TOOL_NAME: &str = "query_influxdb_sql";
pub const TOOL_DESCRIPTION: &str = "Execute a raw SQL query against an InfluxDB datasource \
    through the gateway and return the result as a list of rows keyed by column name.";

/// Parameters of the `query_influxdb_sql` tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfluxSqlParams {
    #[serde(default)]
    #[validate(length(min = 1, message = "datasourceUid is required"))]
    pub datasource_uid: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "sql is required"))]
    pub sql: String,
}

impl QueryInfluxSqlParams {
    pub fn new(datasource_uid: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            datasource_uid: datasource_uid.into(),
            sql: sql.into(),
        }
    }

    fn check(&self) -> Result<(), QueryError> {
        self.validate().map_err(|errors| {
            let mut fields: Vec<String> =
                errors.field_errors().keys().map(|k| k.to_string()).collect();
            fields.sort_unstable();
            QueryError::InvalidRequest(format!("missing required parameter(s): {}", fields.join(", ")))
        })
    }

    /// Run the query these parameters describe.
    pub async fn execute(
        &self,
        ctx: &GatewayContext,
        resolver: &dyn DatasourceResolver,
        cancel: &CancellationToken,
    ) -> Result<Vec<RowRecord>, QueryError> {
        execute_sql(ctx, resolver, &self.datasource_uid, &self.sql, cancel).await
    }
}

/// Query client bound to one resolved datasource.
#[derive(Debug, Clone)]
pub struct InfluxSqlClient {
    transport: AuthenticatedTransport,
    endpoint: String,
    datasource: Datasource,
}

impl InfluxSqlClient {
    /// Resolve `uid` and bind a client to it.
    ///
    /// Fails with [`QueryError::DatasourceNotFound`] or
    /// [`QueryError::Resolution`] before anything is sent to the query endpoint.
    pub async fn connect(
        ctx: &GatewayContext,
        resolver: &dyn DatasourceResolver,
        uid: &str,
    ) -> Result<Self, QueryError> {
        if uid.is_empty() {
            return Err(QueryError::InvalidRequest(
                "missing required parameter(s): datasource_uid".to_string(),
            ));
        }

        let datasource = resolver
            .resolve(uid)
            .await
            .map_err(|source| QueryError::Resolution {
                uid: uid.to_string(),
                source,
            })?
            .ok_or_else(|| QueryError::DatasourceNotFound {
                uid: uid.to_string(),
            })?;

        tracing::debug!(uid = %datasource.uid, name = %datasource.name, "Resolved datasource");

        Ok(Self {
            transport: AuthenticatedTransport::new(ctx)?,
            endpoint: ctx.endpoint(QUERY_PATH),
            datasource,
        })
    }

    pub fn datasource(&self) -> &Datasource {
        &self.datasource
    }

    /// Send `sql` and materialize the reply.
    ///
    /// Cancelling `cancel` aborts the request, including reading the body.
    pub async fn query(
        &self,
        sql: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<RowRecord>, QueryError> {
        let envelope = QueryEnvelope::for_last_hour(&self.datasource.uid, sql);
        let request = self
            .transport
            .client()
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&envelope)
            .build()
            .map_err(|e| QueryError::InvalidRequest(format!("failed to build query request: {}", e)))?;

        let exchange = async {
            let response = self.transport.send(request).await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Query cancelled before the gateway replied");
                return Err(QueryError::Cancelled);
            }
            result = exchange => {
                result.map_err(|e| QueryError::from_transport(e, self.transport.timeout()))?
            }
        };

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Gateway replied");

        let columns = decode::decode_response(status, &body)?;
        rows::materialize(columns)
    }
}

/// Execute `sql` against the InfluxDB datasource `uid`.
///
/// Both parameters are required; an empty one fails before any network call.
/// Returns one record per row in result order, or an empty list when the
/// gateway sent no frames or an empty frame.
pub async fn execute_sql(
    ctx: &GatewayContext,
    resolver: &dyn DatasourceResolver,
    uid: &str,
    sql: &str,
    cancel: &CancellationToken,
) -> Result<Vec<RowRecord>, QueryError> {
    QueryInfluxSqlParams::new(uid, sql).check()?;

    let span = tracing::info_span!("influxdb_sql", datasource_uid = %uid);
    async move {
        tracing::debug!(sql = %redact_sql(sql), "Executing InfluxDB SQL");

        let client = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(QueryError::Cancelled),
            client = InfluxSqlClient::connect(ctx, resolver, uid) => client?,
        };

        let started = std::time::Instant::now();
        let rows = client.query(sql, cancel).await?;
        tracing::info!(
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "InfluxDB SQL query completed"
        );
        Ok(rows)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fluxgate_common::auth::GatewayCredentials;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DatasourceResolver for CountingResolver {
        async fn resolve(&self, uid: &str) -> anyhow::Result<Option<Datasource>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Datasource {
                uid: uid.to_string(),
                name: "test".to_string(),
                kind: DATASOURCE_TYPE.to_string(),
            }))
        }
    }

    fn ctx() -> GatewayContext {
        // Unroutable; none of these tests may reach the network
        GatewayContext::new("http://127.0.0.1:9", GatewayCredentials::default())
    }

    #[test]
    fn test_params_deserialize_camel_case() {
        let params: QueryInfluxSqlParams =
            serde_json::from_str(r#"{"datasourceUid": "infra01", "sql": "SELECT 1"}"#).unwrap();
        assert_eq!(params, QueryInfluxSqlParams::new("infra01", "SELECT 1"));
        assert!(params.check().is_ok());
    }

    #[test]
    fn test_params_missing_fields_fail_validation() {
        let params: QueryInfluxSqlParams = serde_json::from_str(r#"{"sql": ""}"#).unwrap();
        match params.check().unwrap_err() {
            QueryError::InvalidRequest(msg) => {
                assert!(msg.to_lowercase().contains("datasource"), "{}", msg);
                assert!(msg.contains("sql"), "{}", msg);
            }
            other => panic!("Expected invalid request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_parameters_skip_resolution() {
        let resolver = CountingResolver::default();
        let cancel = CancellationToken::new();

        let err = execute_sql(&ctx(), &resolver, "", "SELECT 1", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = execute_sql(&ctx(), &resolver, "infra01", "", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_query() {
        let resolver = CountingResolver::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = execute_sql(&ctx(), &resolver, "infra01", "SELECT 1", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Cancelled));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_client_endpoint() {
        let resolver = CountingResolver::default();
        let ctx = GatewayContext::new("http://gateway.test/", GatewayCredentials::default());
        let client = InfluxSqlClient::connect(&ctx, &resolver, "infra01").await.unwrap();

        assert_eq!(client.endpoint, "http://gateway.test/api/ds/query?ds_type=influxdb");
        assert_eq!(client.datasource().uid, "infra01");
    }
}
