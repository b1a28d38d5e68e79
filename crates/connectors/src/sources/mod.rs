//! Gateway-backed data sources.
//!
//! Queries are proxied through the gateway's multi-datasource endpoint. Before a
//! query is sent the datasource uid is resolved through a [`DatasourceResolver`],
//! so an unknown uid fails without a query reaching the gateway.
//!
//! # Modules
//!
//! | Module         | Description |
//! |----------------|-------------|
//! | `gateway_auth` | Credential injection for every outbound request |
//! | `influxdb`     | Raw SQL against InfluxDB datasources, decoded into rows |

use anyhow::{Context, Result};
use async_trait::async_trait;
use fluxgate_common::auth::GatewayContext;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub mod gateway_auth;
pub mod influxdb;

use gateway_auth::AuthenticatedTransport;

/// A datasource as the gateway describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasource {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Looks up datasources by uid.
///
/// `Ok(None)` means the gateway has no datasource with that uid; `Err` means
/// the lookup itself failed.
#[async_trait]
pub trait DatasourceResolver: Send + Sync {
    async fn resolve(&self, uid: &str) -> Result<Option<Datasource>>;
}

/// Resolver backed by `GET /api/datasources/uid/{uid}`.
#[derive(Debug, Clone)]
pub struct HttpDatasourceResolver {
    transport: AuthenticatedTransport,
    base_url: String,
}

impl HttpDatasourceResolver {
    pub fn new(ctx: &GatewayContext) -> std::result::Result<Self, influxdb::QueryError> {
        Ok(Self {
            transport: AuthenticatedTransport::new(ctx)?,
            base_url: ctx.base_url().to_string(),
        })
    }
}

#[async_trait]
impl DatasourceResolver for HttpDatasourceResolver {
    async fn resolve(&self, uid: &str) -> Result<Option<Datasource>> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid gateway URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Gateway URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["api", "datasources", "uid", uid]);

        let request = self
            .transport
            .client()
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .build()
            .context("Failed to build datasource lookup request")?;

        let response = self
            .transport
            .send(request)
            .await
            .context("Datasource lookup request failed")?;

        match response.status() {
            StatusCode::OK => {
                let datasource: Datasource = response
                    .json()
                    .await
                    .context("Failed to parse datasource lookup response")?;
                if datasource.kind != influxdb::DATASOURCE_TYPE {
                    tracing::warn!(
                        uid = %datasource.uid,
                        kind = %datasource.kind,
                        "Datasource is not of type {}",
                        influxdb::DATASOURCE_TYPE
                    );
                }
                Ok(Some(datasource))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                let body = response.text().await.unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "Failed to read datasource lookup error body");
                    String::new()
                });
                anyhow::bail!("Datasource lookup returned {}: {}", status.as_u16(), body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxgate_common::auth::GatewayCredentials;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(server: &MockServer) -> HttpDatasourceResolver {
        let ctx = GatewayContext::new(server.uri(), GatewayCredentials::api_key("key"));
        HttpDatasourceResolver::new(&ctx).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/datasources/uid/infra01"))
            .and(header("Authorization", "Bearer key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 7,
                "uid": "infra01",
                "name": "Infra",
                "type": "influxdb"
            })))
            .mount(&server)
            .await;

        let ds = resolver(&server).resolve("infra01").await.unwrap().unwrap();
        assert_eq!(ds.name, "Infra");
        assert_eq!(ds.kind, "influxdb");
    }

    #[tokio::test]
    async fn test_resolve_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/datasources/uid/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(resolver(&server).resolve("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let err = resolver(&server).resolve("infra01").await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("down"));
    }

    #[tokio::test]
    async fn test_uid_is_path_escaped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/datasources/uid/a%2Fb"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        assert!(resolver(&server).resolve("a/b").await.unwrap().is_none());
    }
}
