//! Common building blocks shared across fluxgate crates.
//!
//! - **Authentication**: gateway credentials and the explicit call context (`auth`).
//! - **Configuration**: gateway profiles from file and environment (`config`).
//! - **Telemetry**: logging/tracing initialization (`telemetry`).
//! - **Log hygiene**: SQL redaction before logging (`scrubber`).
pub mod auth;
pub mod config;
pub mod scrubber;
pub mod telemetry;
