//! Row materialization: column-oriented data into one JSON object per row.

use super::decode::ColumnData;
use super::error::{DecodeStage, QueryError};
use super::frames::ArrowFrame;
use arrow_json::writer::JsonArray;
use arrow_json::WriterBuilder;
use serde_json::Value;

/// One result row keyed by field name.
pub type RowRecord = serde_json::Map<String, Value>;

pub fn materialize(data: ColumnData) -> Result<Vec<RowRecord>, QueryError> {
    match data {
        ColumnData::Empty => Ok(Vec::new()),
        ColumnData::Arrow(frame) => frame_to_rows(&frame),
        ColumnData::Matrix { names, values } => matrix_to_rows(&names, values),
    }
}

/// Every field of the frame appears in every row; nulls are kept as `null`.
pub fn frame_to_rows(frame: &ArrowFrame) -> Result<Vec<RowRecord>, QueryError> {
    if frame.num_rows() == 0 {
        return Ok(Vec::new());
    }

    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .with_explicit_nulls(true)
            .build::<_, JsonArray>(&mut buf);
        writer
            .write(frame.batch())
            .map_err(|e| QueryError::decode(DecodeStage::Rows, e))?;
        writer
            .finish()
            .map_err(|e| QueryError::decode(DecodeStage::Rows, e))?;
    }

    serde_json::from_slice(&buf).map_err(|e| QueryError::decode(DecodeStage::Rows, e))
}

/// `names` holds one entry per column of `values`.
///
/// The row count is the length of the first column. A shorter column is a
/// decode error; values past the row count in a longer column are ignored.
pub fn matrix_to_rows(names: &[String], values: Vec<Vec<Value>>) -> Result<Vec<RowRecord>, QueryError> {
    let rows = match values.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Ok(Vec::new()),
    };

    if let Some((index, column)) = values.iter().enumerate().find(|(_, c)| c.len() < rows) {
        return Err(QueryError::Decode {
            stage: DecodeStage::Rows,
            source: anyhow::anyhow!(
                "column {} has {} values but the matrix has {} rows",
                index,
                column.len(),
                rows
            ),
        });
    }

    let mut columns: Vec<_> = values.into_iter().map(Vec::into_iter).collect();
    let mut records = Vec::with_capacity(rows);
    for _ in 0..rows {
        let mut record = RowRecord::with_capacity(columns.len());
        for (name, column) in names.iter().zip(columns.iter_mut()) {
            record.insert(name.clone(), column.next().unwrap_or(Value::Null));
        }
        records.push(record);
    }

    Ok(records)
}
