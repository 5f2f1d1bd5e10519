//! In-memory Arrow frame: the intermediary between a Parquet file and a table.

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{
    array::{ArrayRef, RecordBatch},
    compute::cast,
    datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
    error::ArrowError,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use snafu::ResultExt;
use tracing::debug;

use crate::error::{ArrowSnafu, CoreResult, OpenParquetSnafu, ReadParquetSnafu};

/// Record batches sharing one schema, fully materialized in memory.
#[derive(Debug, Clone)]
pub struct Frame {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
    source: Option<PathBuf>,
}

impl Frame {
    /// Build a frame from batches that already share `schema`.
    pub fn from_batches(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self {
            schema,
            batches,
            source: None,
        }
    }

    /// Read a whole Parquet file into memory.
    pub fn read_parquet(path: &Path) -> CoreResult<Self> {
        let path_str = path.display().to_string();
        let file = File::open(path).context(OpenParquetSnafu {
            path: path_str.clone(),
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).context(ReadParquetSnafu {
            path: path_str.clone(),
        })?;
        let schema = builder.schema().clone();
        let reader = builder.build().context(ReadParquetSnafu {
            path: path_str.clone(),
        })?;

        let batches = reader
            .collect::<Result<Vec<_>, ArrowError>>()
            .context(ArrowSnafu)?;

        debug!(
            path = %path_str,
            batches = batches.len(),
            columns = schema.fields().len(),
            "read parquet into frame"
        );

        Ok(Self {
            schema,
            batches,
            source: Some(path.to_path_buf()),
        })
    }

    /// Arrow schema shared by every batch.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The record batches, in file order.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// File the frame was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Total rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Rewrite columns into the shapes the DuckDB appender accepts:
    /// dictionaries are unpacked, large and view layouts become plain
    /// 32-bit offsets, and times and timestamps are rescaled to microseconds.
    pub fn normalized(&self) -> CoreResult<Self> {
        let targets: Vec<Option<DataType>> = self
            .schema
            .fields()
            .iter()
            .map(|f| append_type(f.data_type()))
            .collect();

        if targets.iter().all(Option::is_none) {
            return Ok(self.clone());
        }

        let fields: Vec<Field> = self
            .schema
            .fields()
            .iter()
            .zip(&targets)
            .map(|(field, target)| match target {
                Some(ty) => field.as_ref().clone().with_data_type(ty.clone()),
                None => field.as_ref().clone(),
            })
            .collect();
        let schema = Arc::new(Schema::new_with_metadata(
            fields,
            self.schema.metadata().clone(),
        ));

        let mut batches = Vec::with_capacity(self.batches.len());
        for batch in &self.batches {
            let columns = batch
                .columns()
                .iter()
                .zip(&targets)
                .map(|(col, target)| match target {
                    Some(ty) => cast(col.as_ref(), ty),
                    None => Ok(Arc::clone(col)),
                })
                .collect::<Result<Vec<ArrayRef>, ArrowError>>()
                .context(ArrowSnafu)?;
            batches.push(RecordBatch::try_new(Arc::clone(&schema), columns).context(ArrowSnafu)?);
        }

        Ok(Self {
            schema,
            batches,
            source: self.source.clone(),
        })
    }
}

/// Target type for a column that needs casting before it is appended.
fn append_type(data_type: &DataType) -> Option<DataType> {
    match data_type {
        DataType::Dictionary(_, value) => {
            Some(append_type(value).unwrap_or_else(|| value.as_ref().clone()))
        }
        DataType::LargeUtf8 | DataType::Utf8View => Some(DataType::Utf8),
        DataType::LargeBinary | DataType::BinaryView | DataType::FixedSizeBinary(_) => {
            Some(DataType::Binary)
        }
        DataType::Float16 => Some(DataType::Float32),
        DataType::Date64 => Some(DataType::Date32),
        DataType::Time32(_) => Some(DataType::Time64(TimeUnit::Microsecond)),
        DataType::Time64(TimeUnit::Nanosecond) => Some(DataType::Time64(TimeUnit::Microsecond)),
        DataType::Timestamp(unit, tz) if *unit != TimeUnit::Microsecond => {
            Some(DataType::Timestamp(TimeUnit::Microsecond, tz.clone()))
        }
        _ => None,
    }
}
