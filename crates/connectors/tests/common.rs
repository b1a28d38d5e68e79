#![allow(dead_code)]

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use base64::Engine;
use fluxgate_common::auth::{GatewayContext, GatewayCredentials};
use fluxgate_connectors::sources::{Datasource, DatasourceResolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Resolver with a fixed answer that counts lookups.
pub struct StaticResolver {
    answer: Result<Option<Datasource>, String>,
    pub calls: AtomicUsize,
}

impl StaticResolver {
    pub fn influxdb(uid: &str) -> Self {
        Self::answering(Ok(Some(Datasource {
            uid: uid.to_string(),
            name: format!("{} (test)", uid),
            kind: "influxdb".to_string(),
        })))
    }

    pub fn missing() -> Self {
        Self::answering(Ok(None))
    }

    pub fn failing(message: &str) -> Self {
        Self::answering(Err(message.to_string()))
    }

    fn answering(answer: Result<Option<Datasource>, String>) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasourceResolver for StaticResolver {
    async fn resolve(&self, _uid: &str) -> anyhow::Result<Option<Datasource>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(|m| anyhow::anyhow!(m))
    }
}

pub fn api_key_context(uri: &str) -> GatewayContext {
    GatewayContext::new(uri, GatewayCredentials::api_key("test-key"))
}

/// `host`/`cpu`/`ts` batch with a null in each nullable column.
pub fn metrics_batch() -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("host", DataType::Utf8, true),
        Field::new("cpu", DataType::Float64, true),
        Field::new("ts", DataType::Int64, false),
    ]);
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![Some("a"), None])),
        Arc::new(Float64Array::from(vec![None, Some(20.5)])),
        Arc::new(Int64Array::from(vec![1_714_564_800_000, 1_714_564_801_000])),
    ];
    RecordBatch::try_new(Arc::new(schema), columns).unwrap()
}

/// Arrow IPC file bytes, zstd-compressed and base64-encoded.
pub fn encode_frame(batch: &RecordBatch) -> String {
    let mut ipc = Vec::new();
    {
        let mut writer = FileWriter::try_new(&mut ipc, &batch.schema()).unwrap();
        writer.write(batch).unwrap();
        writer.finish().unwrap();
    }
    let compressed = zstd::stream::encode_all(ipc.as_slice(), 3).unwrap();
    base64::engine::general_purpose::STANDARD.encode(compressed)
}
