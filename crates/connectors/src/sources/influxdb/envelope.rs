//! Request body for the gateway's multi-datasource query endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Reference id of the single query in an envelope; results come back keyed by it.
pub const REF_ID: &str = "A";
pub const DATASOURCE_TYPE: &str = "influxdb";
pub const TABLE_FORMAT: &str = "table";

/// Time range carried in the envelope, as Unix milliseconds.
///
/// Filtering belongs in the SQL text; the gateway only requires the range to
/// be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from_ms: i64,
    pub to_ms: i64,
}

impl TimeWindow {
    /// The hour ending at `now`.
    pub fn trailing_hour(now: DateTime<Utc>) -> Self {
        let to_ms = now.timestamp_millis();
        Self {
            from_ms: to_ms - Duration::hours(1).num_milliseconds(),
            to_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub ref_id: String,
    pub datasource: DatasourceRef,
    pub format: String,
    pub raw_sql: String,
    pub raw_query: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryEnvelope {
    pub queries: Vec<QueryDescriptor>,
    pub from: String,
    pub to: String,
}

impl QueryEnvelope {
    /// One raw-SQL table query against `uid`, tagged with [`REF_ID`].
    pub fn new(uid: &str, sql: &str, window: TimeWindow) -> Self {
        Self {
            queries: vec![QueryDescriptor {
                ref_id: REF_ID.to_string(),
                datasource: DatasourceRef {
                    kind: DATASOURCE_TYPE.to_string(),
                    uid: uid.to_string(),
                },
                format: TABLE_FORMAT.to_string(),
                raw_sql: sql.to_string(),
                raw_query: true,
            }],
            from: window.from_ms.to_string(),
            to: window.to_ms.to_string(),
        }
    }

    /// Envelope whose window is the hour ending now.
    pub fn for_last_hour(uid: &str, sql: &str) -> Self {
        Self::new(uid, sql, TimeWindow::trailing_hour(Utc::now()))
    }
}
