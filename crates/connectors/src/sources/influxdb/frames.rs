//! Binary columnar frames: base64 text wrapping a zstd block wrapping Arrow IPC.
use super::error::{DecodeStage, QueryError};
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::ipc::reader::{FileReader, StreamReader};
use arrow::record_batch::RecordBatch;
use base64::Engine;
use std::io::Cursor;

/// Leading magic of the Arrow IPC file format.
const ARROW_FILE_MAGIC: &[u8] = b"ARROW1";

/// One decoded frame: named fields with a shared row count.
#[derive(Debug, Clone)]
pub struct ArrowFrame {
    pub name: Option<String>,
    batch: RecordBatch,
}

impl ArrowFrame {
    pub fn new(batch: RecordBatch) -> Self {
        let name = batch.schema().metadata().get("name").cloned();
        Self { name, batch }
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }
}

/// Decode the string form of a frame's `data` field.
pub fn decode_encoded_frames(encoded: &str) -> Result<Vec<ArrowFrame>, QueryError> {
    let compressed = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| QueryError::decode(DecodeStage::Base64, e))?;

    let ipc = zstd::stream::decode_all(Cursor::new(compressed))
        .map_err(|e| QueryError::decode(DecodeStage::Decompress, e))?;

    tracing::trace!(bytes = ipc.len(), "Decompressed arrow frame");

    read_arrow_frames(&[ipc.as_slice()])
}

/// Parse each IPC blob into one frame.
pub fn read_arrow_frames(blobs: &[&[u8]]) -> Result<Vec<ArrowFrame>, QueryError> {
    blobs
        .iter()
        .map(|bytes| read_arrow_frame(bytes).map_err(|e| QueryError::decode(DecodeStage::Frame, e)))
        .collect()
}

fn read_arrow_frame(bytes: &[u8]) -> Result<ArrowFrame, ArrowError> {
    let (schema, batches) = if bytes.starts_with(ARROW_FILE_MAGIC) {
        let reader = FileReader::try_new(Cursor::new(bytes), None)?;
        let schema = reader.schema();
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        (schema, batches)
    } else {
        let reader = StreamReader::try_new(Cursor::new(bytes), None)?;
        let schema = reader.schema();
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        (schema, batches)
    };

    let mut batches = batches;
    let batch = match batches.len() {
        0 => RecordBatch::new_empty(schema),
        1 => batches.remove(0),
        _ => arrow::compute::concat_batches(&schema, &batches)?,
    };

    Ok(ArrowFrame::new(batch))
}
