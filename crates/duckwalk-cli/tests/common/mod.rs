#![allow(dead_code)]

use std::{
    io,
    path::Path,
    process::{Command, Output},
    sync::Arc,
};

use arrow::array::{Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn cli_bin() -> &'static str {
    env!("CARGO_BIN_EXE_duckwalk")
}

/// Run the CLI with `--data-dir` pointed at `data_dir`, logging silenced.
pub fn run_cli(data_dir: &Path, args: &[&str]) -> io::Result<Output> {
    Command::new(cli_bin())
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("DUCKWALK_PARQUET")
        .env("RUST_LOG", "off")
        .output()
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn assert_cli_success(output: &Output) {
    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub const COMMUNITIES: &[(&str, i64)] = &[
    ("Uptown", 35_787),
    ("Hyde Park", 39_056),
    ("Englewood", 11_888),
];

pub fn write_ticket_parquet(path: &Path, rows: usize) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut ticket_builder = Int64Builder::with_capacity(rows);
    let mut community_builder = StringBuilder::new();
    let mut income_builder = Int64Builder::with_capacity(rows);
    let mut fine_builder = Float64Builder::with_capacity(rows);

    for i in 0..rows {
        let (community, income) = COMMUNITIES[i % COMMUNITIES.len()];
        ticket_builder.append_value(50_000 + i as i64);
        community_builder.append_value(community);
        income_builder.append_value(income);
        fine_builder.append_value(if i % 4 == 0 { 250.0 } else { 60.0 });
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Ticket_Number", DataType::Int64, false),
        Field::new("Community_Name", DataType::Utf8, false),
        Field::new("Per_capita_income", DataType::Int64, false),
        Field::new("Fine_Level1_Amount", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(ticket_builder.finish()) as _,
            Arc::new(community_builder.finish()),
            Arc::new(income_builder.finish()),
            Arc::new(fine_builder.finish()),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
