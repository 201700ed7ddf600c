//! Parquet persistence for record series.
//!
//! One file per series, one row per `(record, slot)`:
//!
//! | column         | type          | notes                                    |
//! |----------------|---------------|------------------------------------------|
//! | `id`           | `UInt64`      | step or scalar id                        |
//! | `timestamp_us` | `Int64`       | microseconds since the Unix epoch        |
//! | `capacity`     | `UInt32`      | reserved slots of the record             |
//! | `slot`         | `UInt32?`     | null only for zero-capacity records      |
//! | `payload`      | `Binary?`     | null when the slot was never written     |
//! | `shape`        | `List<UInt64>?` | null when the slot was never written   |
//!
//! The series tag and captions are kept in the Arrow schema metadata.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BinaryArray, Int64Array, ListArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Int64Type, Schema, SchemaRef, UInt32Type, UInt64Type};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use crate::record::{Record, Series, Slot};
use crate::{Error, Result};

/// Schema metadata key holding the series tag.
pub const TAG_METADATA_KEY: &str = "vislog.tag";

/// Schema metadata key holding the JSON-encoded caption list.
pub const CAPTIONS_METADATA_KEY: &str = "vislog.captions";

fn series_schema(series: &Series) -> Result<SchemaRef> {
    let mut metadata = HashMap::new();
    metadata.insert(TAG_METADATA_KEY.to_string(), series.tag().to_string());
    metadata.insert(
        CAPTIONS_METADATA_KEY.to_string(),
        serde_json::to_string(series.captions())?,
    );

    Ok(Arc::new(Schema::new_with_metadata(
        vec![
            Field::new("id", DataType::UInt64, false),
            Field::new("timestamp_us", DataType::Int64, false),
            Field::new("capacity", DataType::UInt32, false),
            Field::new("slot", DataType::UInt32, true),
            Field::new("payload", DataType::Binary, true),
            Field::new(
                "shape",
                DataType::List(Arc::new(Field::new("item", DataType::UInt64, true))),
                true,
            ),
        ],
        metadata,
    )))
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::StorageError(format!("{what} {value} exceeds the Parquet u32 column")))
}

/// Convert a series into a single record batch.
///
/// # Errors
/// Returns error if a capacity or slot index does not fit in `u32`
pub fn series_to_batch(series: &Series) -> Result<RecordBatch> {
    let schema = series_schema(series)?;

    let mut ids = Vec::new();
    let mut stamps = Vec::new();
    let mut capacities = Vec::new();
    let mut slots: Vec<Option<u32>> = Vec::new();
    let mut payloads: Vec<Option<&[u8]>> = Vec::new();
    let mut shapes: Vec<Option<Vec<Option<u64>>>> = Vec::new();

    for record in series.records() {
        let capacity = to_u32(record.capacity(), "capacity")?;

        // Zero-capacity records still need a row to survive a reload
        if capacity == 0 {
            ids.push(record.id());
            stamps.push(record.timestamp().timestamp_micros());
            capacities.push(0);
            slots.push(None);
            payloads.push(None);
            shapes.push(None);
            continue;
        }

        for index in 0..record.capacity() {
            let slot = record.slot(index);
            ids.push(record.id());
            stamps.push(record.timestamp().timestamp_micros());
            capacities.push(capacity);
            slots.push(Some(to_u32(index, "slot")?));
            payloads.push(slot.map(Slot::payload));
            shapes.push(slot.map(|s| s.shape().iter().copied().map(Some).collect()));
        }
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(ids)),
        Arc::new(Int64Array::from(stamps)),
        Arc::new(UInt32Array::from(capacities)),
        Arc::new(UInt32Array::from(slots)),
        Arc::new(BinaryArray::from(payloads)),
        Arc::new(ListArray::from_iter_primitive::<UInt64Type, _, _>(shapes)),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Write a series to `path`.
///
/// The file is written next to `path` under a temporary name and renamed into
/// place, so a reader never observes a half-written file.
///
/// # Errors
/// Returns error if the file cannot be created, encoded or moved into place;
/// the temporary file is removed on failure
pub fn write_series(path: &Path, series: &Series) -> Result<()> {
    let batch = series_to_batch(series)?;
    let tmp_path = path.with_extension("parquet.tmp");

    let file = File::create(&tmp_path)?;
    let result = write_batch(file, &batch)
        .and_then(|()| std::fs::rename(&tmp_path, path).map_err(Error::from));
    if let Err(err) = &result {
        tracing::debug!(path = %tmp_path.display(), error = %err, "removing partial series file");
        std::fs::remove_file(&tmp_path).ok();
    }
    result
}

fn write_batch(file: File, batch: &RecordBatch) -> Result<()> {
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(batch)
        .map_err(|e| Error::StorageError(format!("Failed to write record batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::StorageError(format!("Failed to finalize Parquet file: {e}")))?;
    Ok(())
}

/// Read a series previously written by [`write_series`].
///
/// # Errors
/// Returns error if the file cannot be read, lacks the tag metadata, or
/// contains rows that do not describe a valid record
pub fn read_series(path: &Path) -> Result<Series> {
    let file = File::open(path)
        .map_err(|e| Error::StorageError(format!("Failed to open Parquet file: {e}")))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?;

    let metadata = builder.schema().metadata().clone();
    let tag = metadata.get(TAG_METADATA_KEY).ok_or_else(|| {
        Error::StorageError(format!(
            "Parquet file {} has no '{TAG_METADATA_KEY}' metadata",
            path.display()
        ))
    })?;
    let captions: Vec<String> = match metadata.get(CAPTIONS_METADATA_KEY) {
        Some(raw) => serde_json::from_str(raw)?,
        None => Vec::new(),
    };

    let reader = builder
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut series = Series::new(tag.as_str());
    for caption in captions {
        series.add_caption(caption);
    }

    let mut pending = None;
    for batch in reader {
        let batch = batch
            .map_err(|e| Error::StorageError(format!("Failed to read record batch: {e}")))?;
        append_batch(&mut series, &mut pending, &batch)?;
    }
    if let Some(record) = pending {
        series.push(record);
    }

    Ok(series)
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::StorageError(format!("Missing column '{name}'")))
}

fn corrupt(detail: &str) -> Error {
    Error::StorageError(format!("Corrupt series file: {detail}"))
}

/// Append the records encoded in `batch` to `series`.
///
/// A new record starts at every row whose slot is null or 0. The last record
/// of the batch is left in `pending` since its slots may continue in the next
/// batch; the caller pushes it once the file is exhausted.
fn append_batch(
    series: &mut Series,
    pending: &mut Option<Record>,
    batch: &RecordBatch,
) -> Result<()> {
    let ids = column(batch, "id")?
        .as_primitive_opt::<UInt64Type>()
        .ok_or_else(|| corrupt("id is not UInt64"))?;
    let stamps = column(batch, "timestamp_us")?
        .as_primitive_opt::<Int64Type>()
        .ok_or_else(|| corrupt("timestamp_us is not Int64"))?;
    let capacities = column(batch, "capacity")?
        .as_primitive_opt::<UInt32Type>()
        .ok_or_else(|| corrupt("capacity is not UInt32"))?;
    let slots = column(batch, "slot")?
        .as_primitive_opt::<UInt32Type>()
        .ok_or_else(|| corrupt("slot is not UInt32"))?;
    let payloads = column(batch, "payload")?
        .as_binary_opt::<i32>()
        .ok_or_else(|| corrupt("payload is not Binary"))?;
    let shapes = column(batch, "shape")?
        .as_list_opt::<i32>()
        .ok_or_else(|| corrupt("shape is not a List"))?;

    for row in 0..batch.num_rows() {
        let starts_record = slots.is_null(row) || slots.value(row) == 0;
        if starts_record {
            if let Some(record) = pending.take() {
                series.push(record);
            }
            let timestamp = DateTime::from_timestamp_micros(stamps.value(row))
                .ok_or_else(|| corrupt("timestamp out of range"))?;
            let capacity = usize::try_from(capacities.value(row))
                .map_err(|_| corrupt("capacity does not fit in usize"))?;
            *pending = Some(Record::new(ids.value(row), timestamp, capacity));
        }

        if slots.is_null(row) || payloads.is_null(row) || shapes.is_null(row) {
            continue;
        }

        let record = pending
            .as_mut()
            .ok_or_else(|| corrupt("slot row before its record"))?;
        let index = usize::try_from(slots.value(row))
            .map_err(|_| corrupt("slot does not fit in usize"))?;
        let shape_values = shapes.value(row);
        let shape = shape_values
            .as_primitive_opt::<UInt64Type>()
            .ok_or_else(|| corrupt("shape items are not UInt64"))?
            .values()
            .to_vec();
        let slot = Slot::new(payloads.value(row).to_vec(), shape);

        if !record.set_slot(index, slot) {
            return Err(corrupt("slot index exceeds record capacity"));
        }
    }

    Ok(())
}
