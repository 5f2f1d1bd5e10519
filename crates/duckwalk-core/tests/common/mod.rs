#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use arrow::array::{Float64Builder, Int64Builder, StringBuilder, TimestampMillisecondBuilder};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub const COMMUNITIES: &[(&str, i64)] = &[
    ("Rogers Park", 23_939),
    ("Lincoln Park", 71_551),
    ("Austin", 15_957),
    ("Loop", 65_526),
];

/// Parking-ticket shaped rows spread over several row groups.
pub fn write_ticket_parquet(path: &Path, rows: usize) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut ticket_builder = Int64Builder::with_capacity(rows);
    let mut issued_builder = TimestampMillisecondBuilder::with_capacity(rows);
    let mut community_builder = StringBuilder::new();
    let mut income_builder = Int64Builder::with_capacity(rows);
    let mut fine_builder = Float64Builder::with_capacity(rows);

    let base_ts = 1_600_000_000_000i64;
    for i in 0..rows {
        let (community, income) = COMMUNITIES[i % COMMUNITIES.len()];
        ticket_builder.append_value(9_000_000 + i as i64);
        issued_builder.append_value(base_ts + (i as i64) * 60_000);
        community_builder.append_value(community);
        if i % 7 == 0 {
            income_builder.append_null();
        } else {
            income_builder.append_value(income);
        }
        fine_builder.append_value(25.0 + (i % 5) as f64 * 25.0);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Ticket_Number", DataType::Int64, false),
        Field::new(
            "Issue_Date",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new("Community_Name", DataType::Utf8, false),
        Field::new("Per_capita_income", DataType::Int64, true),
        Field::new("Fine_Level1_Amount", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(ticket_builder.finish()) as _,
            Arc::new(issued_builder.finish()),
            Arc::new(community_builder.finish()),
            Arc::new(income_builder.finish()),
            Arc::new(fine_builder.finish()),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let props = WriterProperties::builder()
        .set_max_row_group_size(64)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}
