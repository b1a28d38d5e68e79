//! Authenticating transport for gateway calls.
//!
//! Every outbound request gets exactly one credential scheme attached:
//!
//! | Credentials present              | Headers set                          |
//! |----------------------------------|--------------------------------------|
//! | access token AND id token        | `X-Access-Token`, `X-Grafana-Id`     |
//! | otherwise a non-empty API key    | `Authorization: Bearer <key>`        |
//! | nothing                          | none                                 |
//!
//! The destination and body of the request are never touched, and transport
//! failures are returned unchanged.

use crate::sources::influxdb::error::QueryError;
use fluxgate_common::auth::{AuthScheme, GatewayContext, GatewayCredentials};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;

pub const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";
pub const ID_TOKEN_HEADER: &str = "X-Grafana-Id";

fn sensitive_value(value: &str) -> Result<HeaderValue, QueryError> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        QueryError::InvalidRequest(
            "credential contains characters that are not valid in an HTTP header".to_string(),
        )
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// Build the auth headers for one credential set.
pub fn auth_headers(credentials: &GatewayCredentials) -> Result<HeaderMap, QueryError> {
    let mut headers = HeaderMap::new();
    match credentials.scheme() {
        AuthScheme::OnBehalfOf {
            access_token,
            id_token,
        } => {
            headers.insert(ACCESS_TOKEN_HEADER, sensitive_value(access_token)?);
            headers.insert(ID_TOKEN_HEADER, sensitive_value(id_token)?);
        }
        AuthScheme::ApiKey(key) => {
            headers.insert(AUTHORIZATION, sensitive_value(&format!("Bearer {}", key))?);
        }
        AuthScheme::Anonymous => {}
    }
    Ok(headers)
}

/// Wraps a `reqwest::Client`, injecting credentials into each request.
#[derive(Debug, Clone)]
pub struct AuthenticatedTransport {
    client: reqwest::Client,
    auth_headers: HeaderMap,
    timeout: Duration,
}

impl AuthenticatedTransport {
    /// Transport with its own connection pool.
    pub fn new(ctx: &GatewayContext) -> Result<Self, QueryError> {
        Self::with_client(reqwest::Client::new(), ctx)
    }

    /// Transport sharing the pool of an existing client.
    pub fn with_client(client: reqwest::Client, ctx: &GatewayContext) -> Result<Self, QueryError> {
        Ok(Self {
            client,
            auth_headers: auth_headers(ctx.credentials())?,
            timeout: ctx.timeout(),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Attach credentials, and the call timeout unless the request has its own.
    pub fn authorize(&self, request: &mut reqwest::Request) {
        for (name, value) in &self.auth_headers {
            request.headers_mut().insert(name.clone(), value.clone());
        }
        if request.timeout().is_none() {
            *request.timeout_mut() = Some(self.timeout);
        }
    }

    pub async fn send(&self, mut request: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.authorize(&mut request);
        self.client.execute(request).await
    }
}
