use fluxgate_error::{ErrorCode, ErrorContext, FluxgateError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage at which a response failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    /// Outer JSON response envelope
    Envelope,
    Base64,
    /// zstd block
    Decompress,
    /// Arrow IPC frame
    Frame,
    /// Row materialization
    Rows,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodeStage::Envelope => "response envelope",
            DecodeStage::Base64 => "base64 frame",
            DecodeStage::Decompress => "zstd block",
            DecodeStage::Frame => "arrow frame",
            DecodeStage::Rows => "rows",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Resolution,
    Transport,
    Gateway,
    Decode,
    UnknownFormat,
}

/// Errors from a single SQL query call. None are retried.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Datasource '{uid}' not found")]
    DatasourceNotFound { uid: String },

    #[error("Failed to resolve datasource '{uid}': {source}")]
    Resolution {
        uid: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Request to gateway failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Request to gateway timed out after {0:?}")]
    Timeout(Duration),

    #[error("Query cancelled")]
    Cancelled,

    #[error("Gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },

    #[error("Failed to decode {stage}: {source}")]
    Decode {
        stage: DecodeStage,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unknown frame data format: {0}")]
    UnknownFormat(String),
}

impl QueryError {
    pub(crate) fn decode<E>(stage: DecodeStage, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        QueryError::Decode {
            stage,
            source: anyhow::Error::new(err),
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            QueryError::Timeout(timeout)
        } else {
            QueryError::Transport(err)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::InvalidRequest(_) => ErrorKind::Validation,
            QueryError::DatasourceNotFound { .. } | QueryError::Resolution { .. } => {
                ErrorKind::Resolution
            }
            QueryError::Transport(_) | QueryError::Timeout(_) | QueryError::Cancelled => {
                ErrorKind::Transport
            }
            QueryError::Gateway { .. } => ErrorKind::Gateway,
            QueryError::Decode { .. } => ErrorKind::Decode,
            QueryError::UnknownFormat(_) => ErrorKind::UnknownFormat,
        }
    }
}

impl From<QueryError> for FluxgateError {
    fn from(err: QueryError) -> Self {
        let message = err.to_string();
        match err {
            QueryError::InvalidRequest(_) => FluxgateError::new(ErrorCode::InvalidRequest, message),
            QueryError::DatasourceNotFound { uid } | QueryError::Resolution { uid, .. } => {
                FluxgateError::new(ErrorCode::DatasourceNotFound, message)
                    .with_context(ErrorContext::Datasource { uid })
                    .with_hint("Check the datasource uid in the gateway's datasource settings")
            }
            QueryError::Transport(_) => FluxgateError::new(ErrorCode::ConnectionFailed, message),
            QueryError::Timeout(_) => FluxgateError::new(ErrorCode::ConnectionTimeout, message)
                .with_hint("Increase the timeout or add a narrower filter to the query"),
            QueryError::Cancelled => FluxgateError::new(ErrorCode::QueryCancelled, message),
            QueryError::Gateway { status, body } => {
                let code = match status {
                    401 | 403 => ErrorCode::AuthenticationFailed,
                    _ => ErrorCode::GatewayRejected,
                };
                FluxgateError::new(code, message)
                    .with_context(ErrorContext::Gateway { status, body })
            }
            QueryError::Decode { stage, source } => {
                FluxgateError::new(ErrorCode::DecodeFailed, message).with_context(
                    ErrorContext::Decode {
                        stage: stage.to_string(),
                        detail: format!("{:#}", source),
                    },
                )
            }
            QueryError::UnknownFormat(reason) => {
                FluxgateError::new(ErrorCode::UnknownPayloadFormat, message).with_context(
                    ErrorContext::Decode {
                        stage: "frame data".to_string(),
                        detail: reason,
                    },
                )
            }
        }
    }
}
