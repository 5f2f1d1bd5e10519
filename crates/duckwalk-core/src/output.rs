//! Export of full query results to CSV or JSON lines.

use std::{fs::File, path::Path};

use arrow::{
    array::RecordBatch,
    datatypes::{DataType, Schema},
};
use snafu::ResultExt;

use crate::error::{ArrowSnafu, CoreResult, CsvUnsupportedTypeSnafu, WriteOutputSnafu};

/// File format for exported results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// One JSON object per line.
    Jsonl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Jsonl => "jsonl",
        })
    }
}

pub(crate) enum OutputWriter {
    Csv(Box<arrow_csv::Writer<File>>),
    Jsonl(Box<arrow_json::LineDelimitedWriter<File>>),
}

impl OutputWriter {
    pub(crate) fn create(path: &Path, format: OutputFormat) -> CoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context(WriteOutputSnafu {
                path: parent.display().to_string(),
            })?;
        }

        let file = File::create(path).context(WriteOutputSnafu {
            path: path.display().to_string(),
        })?;

        match format {
            // The arrow CSV writer has no encoding for list/struct columns.
            OutputFormat::Csv => Ok(OutputWriter::Csv(Box::new(
                arrow_csv::WriterBuilder::new().build(file),
            ))),
            OutputFormat::Jsonl => Ok(OutputWriter::Jsonl(Box::new(
                arrow_json::LineDelimitedWriter::new(file),
            ))),
        }
    }

    pub(crate) fn write_batch(&mut self, batch: &RecordBatch) -> CoreResult<()> {
        match self {
            OutputWriter::Csv(w) => w.write(batch).context(ArrowSnafu),
            OutputWriter::Jsonl(w) => w.write_batches(&[batch]).context(ArrowSnafu),
        }
    }

    pub(crate) fn finish(self) -> CoreResult<()> {
        match self {
            OutputWriter::Csv(_) => Ok(()),
            OutputWriter::Jsonl(mut w) => w.finish().context(ArrowSnafu),
        }
    }
}

/// Reject schemas the CSV writer cannot encode.
pub fn ensure_csv_supported(schema: &Schema) -> CoreResult<()> {
    for field in schema.fields() {
        let dt = field.data_type();
        let unsupported = matches!(
            dt,
            DataType::List(_)
                | DataType::LargeList(_)
                | DataType::FixedSizeList(_, _)
                | DataType::Struct(_)
                | DataType::Map(_, _)
                | DataType::Union(_, _)
        );

        if unsupported {
            return CsvUnsupportedTypeSnafu {
                field: field.name().to_string(),
                data_type: format!("{dt:?}"),
            }
            .fail();
        }
    }

    Ok(())
}

/// Write every batch to `path` in `format`.
pub fn write_batches(
    path: &Path,
    format: OutputFormat,
    schema: &Schema,
    batches: &[RecordBatch],
) -> CoreResult<()> {
    if format == OutputFormat::Csv {
        ensure_csv_supported(schema)?;
    }

    let mut writer = OutputWriter::create(path, format)?;
    for batch in batches {
        writer.write_batch(batch)?;
    }
    writer.finish()
}
