//! # Error Contexts
//!
//! Structured metadata attached to errors so callers can act on them
//! without parsing messages.

use serde::{Deserialize, Serialize};

/// Structured context for machine-readable errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorContext {
    /// Context for FLUXGATE-1001 (DatasourceNotFound)
    Datasource { uid: String },

    /// Context for FLUXGATE-2001 / 4001: the gateway's status and raw body
    Gateway { status: u16, body: String },

    /// Context for FLUXGATE-5001 / 5002
    Decode {
        /// Pipeline stage that failed (envelope, base64, decompress, frame, rows)
        stage: String,
        detail: String,
    },

    /// Context for FLUXGATE-3xxx (config errors)
    Config {
        file_path: Option<String>,
        profile: Option<String>,
        field: Option<String>,
    },

    /// Generic key-value context for extensibility
    Generic {
        #[serde(flatten)]
        data: std::collections::HashMap<String, serde_json::Value>,
    },
}
