//! Gateway credentials and the explicit per-call gateway context.
//!
//! Credentials are never read from process-wide state by the query path: a
//! front-end resolves them once (config file, environment, CLI flags) and
//! threads a [`GatewayContext`] through every call.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Credential set for the gateway.
///
/// The access/id token pair and the API key are alternatives; see
/// [`GatewayCredentials::scheme`] for precedence.
#[derive(Debug, Default)]
pub struct GatewayCredentials {
    pub access_token: Option<SecretString>,
    pub id_token: Option<SecretString>,
    pub api_key: Option<SecretString>,
}

/// The single authentication scheme selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme<'a> {
    /// `X-Access-Token` + `X-Grafana-Id`, acting on behalf of a user.
    OnBehalfOf {
        access_token: &'a str,
        id_token: &'a str,
    },
    /// `Authorization: Bearer <key>`.
    ApiKey(&'a str),
    Anonymous,
}

fn non_empty(secret: &Option<SecretString>) -> Option<&str> {
    secret
        .as_ref()
        .map(|s| s.expose_secret())
        .filter(|s| !s.is_empty())
}

impl GatewayCredentials {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::from(key.into())),
            ..Default::default()
        }
    }

    pub fn on_behalf_of(access_token: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(SecretString::from(access_token.into())),
            id_token: Some(SecretString::from(id_token.into())),
            api_key: None,
        }
    }

    /// Add an API key alongside whatever is already set.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Select the scheme to send.
    ///
    /// The token pair wins only when both halves are non-empty; otherwise a
    /// non-empty API key is used; otherwise the request goes unauthenticated.
    pub fn scheme(&self) -> AuthScheme<'_> {
        match (non_empty(&self.access_token), non_empty(&self.id_token)) {
            (Some(access_token), Some(id_token)) => AuthScheme::OnBehalfOf {
                access_token,
                id_token,
            },
            _ => match non_empty(&self.api_key) {
                Some(key) => AuthScheme::ApiKey(key),
                None => AuthScheme::Anonymous,
            },
        }
    }
}

/// Everything a query call needs to know about where and how to reach the
/// gateway.
#[derive(Debug, Clone)]
pub struct GatewayContext {
    base_url: String,
    credentials: Arc<GatewayCredentials>,
    timeout: Duration,
}

impl GatewayContext {
    /// Trailing slashes on `base_url` are stripped.
    pub fn new(base_url: impl AsRef<str>, credentials: GatewayCredentials) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            credentials: Arc::new(credentials),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &GatewayCredentials {
        &self.credentials
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Join an absolute API path (starting with `/`) onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
