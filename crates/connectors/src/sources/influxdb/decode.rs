//! Response decoding.
//!
//! The gateway answers `/api/ds/query` with `{"results": {"A": {"frames": [...]}}}`.
//! A frame's `data` comes in one of two undeclared shapes:
//!
//! - a JSON string: base64 of a zstd-compressed Arrow IPC frame
//! - a JSON object `{"values": [[...], ...]}`: a column-major value matrix whose
//!   column names live in the frame's `schema.fields[].name`
//!
//! The shape is found by probing: string first, then object.

use super::envelope::REF_ID;
use super::error::{DecodeStage, QueryError};
use super::frames::{decode_encoded_frames, ArrowFrame};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize)]
pub struct GatewayResponse {
    #[serde(default)]
    pub results: HashMap<String, RefResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefResult {
    #[serde(default)]
    pub frames: Vec<ResultFrame>,
    /// Set by the gateway when the datasource rejected the query. Only logged.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct ResultFrame {
    /// Opaque descriptor; only `fields[].name` is read.
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

/// Column-major matrix: `values[c][r]` is column `c`, row `r`.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct ValueMatrix {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub values: Vec<Vec<Value>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Vec<Value>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Vec<Value>>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The two shapes a frame's `data` can take.
#[derive(Debug, PartialEq)]
pub enum FramePayload {
    Encoded(String),
    Matrix(ValueMatrix),
}

impl FramePayload {
    pub fn probe(data: Option<&RawValue>) -> Result<Self, QueryError> {
        let raw = data
            .ok_or_else(|| QueryError::UnknownFormat("frame has no data".to_string()))?
            .get();

        if let Ok(encoded) = serde_json::from_str::<String>(raw) {
            return Ok(FramePayload::Encoded(encoded));
        }

        let object: serde_json::Map<String, Value> = serde_json::from_str(raw).map_err(|_| {
            QueryError::UnknownFormat(format!(
                "expected a string or an object, got {}",
                describe(raw)
            ))
        })?;
        let matrix: ValueMatrix = serde_json::from_value(Value::Object(object))
            .map_err(|e| QueryError::UnknownFormat(format!("object is not a value matrix: {}", e)))?;
        Ok(FramePayload::Matrix(matrix))
    }
}

fn describe(raw: &str) -> &'static str {
    match raw.trim_start().chars().next() {
        Some('[') => "an array",
        Some('t') | Some('f') => "a boolean",
        Some('n') => "null",
        Some('-') | Some('0'..='9') => "a number",
        _ => "malformed JSON",
    }
}

/// Column-oriented result of decoding, ready for row materialization.
#[derive(Debug)]
pub enum ColumnData {
    /// No frames, or an empty frame set.
    Empty,
    Arrow(ArrowFrame),
    Matrix {
        names: Vec<String>,
        values: Vec<Vec<Value>>,
    },
}

/// Decode a raw gateway reply.
pub fn decode_response(status: StatusCode, body: &[u8]) -> Result<ColumnData, QueryError> {
    if status != StatusCode::OK {
        return Err(QueryError::Gateway {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    let mut parsed: GatewayResponse = serde_json::from_slice(body)
        .map_err(|e| QueryError::decode(DecodeStage::Envelope, e))?;

    let Some(result) = parsed.results.remove(REF_ID) else {
        tracing::debug!("No result for ref id {} in gateway response", REF_ID);
        return Ok(ColumnData::Empty);
    };

    if let Some(message) = result.error.as_deref().filter(|m| !m.is_empty()) {
        tracing::warn!(
            ref_id = REF_ID,
            status = ?result.status,
            frames = result.frames.len(),
            "Datasource reported an error: {}",
            message
        );
    }

    let Some(frame) = result.frames.into_iter().next() else {
        return Ok(ColumnData::Empty);
    };

    match FramePayload::probe(frame.data.as_deref())? {
        FramePayload::Encoded(encoded) => {
            tracing::debug!(encoded_len = encoded.len(), "Decoding binary frame payload");
            let frame = decode_encoded_frames(&encoded)?.into_iter().next();
            Ok(frame.map_or(ColumnData::Empty, ColumnData::Arrow))
        }
        FramePayload::Matrix(matrix) => {
            tracing::debug!(columns = matrix.values.len(), "Decoding value matrix payload");
            let names = resolve_field_names(frame.schema.as_ref(), matrix.values.len());
            Ok(ColumnData::Matrix {
                names,
                values: matrix.values,
            })
        }
    }
}

/// One name per column.
///
/// The schema's string names are taken in order, skipping fields without one;
/// columns past the end of that list are named `col<index>`.
pub fn resolve_field_names(schema: Option<&Value>, columns: usize) -> Vec<String> {
    let declared: Vec<&str> = schema
        .and_then(|s| s.get("fields"))
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    (0..columns)
        .map(|c| match declared.get(c) {
            Some(name) => name.to_string(),
            None => format!("col{}", c),
        })
        .collect()
}
