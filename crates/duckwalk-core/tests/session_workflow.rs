#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use arrow::array::{Array, DictionaryArray, Int64Array, LargeStringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Int32Type, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use common::{COMMUNITIES, TestResult, write_ticket_parquet};
use duckwalk_core::{
    CreateMode, DuckwalkError, Frame, OutputFormat, QueryOpts, Session, SessionTarget, Source,
    sql::summarize_projection_sql,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tempfile::TempDir;

const TABLE: &str = "ChicagoParkingTickets";

fn load_tickets(tmp: &TempDir, rows: usize) -> TestResult<(Session, std::path::PathBuf)> {
    let parquet = tmp.path().join("duckdbdata/ChicagoParkingTickets.parquet");
    write_ticket_parquet(&parquet, rows)?;

    let session = Session::open(SessionTarget::File(tmp.path().join("duckdbdata/chicago.db")))?;
    let frame = Frame::read_parquet(&parquet)?;
    session.create_table_from_frame(TABLE, &frame, CreateMode::Replace)?;
    Ok((session, parquet))
}

#[test]
fn file_session_persists_across_reopen() -> TestResult {
    let tmp = TempDir::new()?;
    let target = SessionTarget::File(tmp.path().join("nested/dir/file.db"));

    Session::scoped(target.clone(), |s| -> Result<(), DuckwalkError> {
        s.execute("CREATE TABLE test (i INTEGER)")?;
        s.execute("INSERT INTO test VALUES (42)")?;
        Ok(())
    })?;

    let session = Session::open(target)?;
    let res = session.table("test", &QueryOpts::default())?;
    assert_eq!(res.columns, vec!["i"]);
    assert_eq!(res.preview_value(0, "i"), Some("42"));
    assert_eq!(res.total_rows, 1);
    session.close()?;
    Ok(())
}

#[test]
fn frame_round_trips_into_table() -> TestResult {
    let tmp = TempDir::new()?;
    let (session, parquet) = load_tickets(&tmp, 200)?;

    let frame = Frame::read_parquet(&parquet)?;
    assert_eq!(frame.num_rows(), 200);
    let row_groups = ParquetRecordBatchReaderBuilder::try_new(std::fs::File::open(&parquet)?)?
        .metadata()
        .num_row_groups();
    assert!(row_groups > 1);
    assert_eq!(frame.source(), Some(parquet.as_path()));

    assert_eq!(session.row_count(TABLE)?, 200);

    let described = session.describe(&Source::Table(TABLE.to_string()), &QueryOpts::default())?;
    let names: Vec<&str> = (0..described.preview_rows.len())
        .filter_map(|row| described.preview_value(row, "column_name"))
        .collect();
    assert_eq!(names, frame.column_names());
    assert_eq!(described.preview_value(1, "column_type"), Some("TIMESTAMP"));

    let nulls = session.sql(
        "SELECT count(*) AS n FROM ChicagoParkingTickets WHERE Per_capita_income IS NULL",
        &QueryOpts::default(),
    )?;
    assert_eq!(nulls.preview_value(0, "n"), Some("29"));

    session.close()?;
    Ok(())
}

#[test]
fn dictionary_and_large_string_columns_are_appended() -> TestResult {
    let zones: DictionaryArray<Int32Type> =
        vec!["Loop", "Austin", "Loop"].into_iter().collect();
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("zone", zones.data_type().clone(), false),
        Field::new("note", DataType::LargeUtf8, true),
        Field::new(
            "issued",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
    ]));
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(zones),
            Arc::new(LargeStringArray::from(vec![
                Some("expired meter"),
                None,
                Some("street cleaning"),
            ])),
            Arc::new(TimestampMillisecondArray::from(vec![
                1_600_000_000_000,
                1_600_000_060_000,
                1_600_000_120_500,
            ])),
        ],
    )?;
    let frame = Frame::from_batches(schema, vec![batch]);

    let session = Session::open_in_memory()?;
    assert_eq!(
        session.create_table_from_frame("tickets", &frame, CreateMode::Create)?,
        3
    );

    let described = session.describe(&Source::Table("tickets".to_string()), &QueryOpts::default())?;
    assert_eq!(described.preview_value(1, "column_type"), Some("VARCHAR"));
    assert_eq!(described.preview_value(2, "column_type"), Some("VARCHAR"));
    assert_eq!(described.preview_value(3, "column_type"), Some("TIMESTAMP"));

    let res = session.sql(
        "SELECT zone, note, epoch_ms(issued) AS ms FROM tickets ORDER BY id",
        &QueryOpts::default(),
    )?;
    assert_eq!(res.preview_value(0, "zone"), Some("Loop"));
    assert_eq!(res.preview_value(1, "zone"), Some("Austin"));
    assert_eq!(res.preview_value(0, "note"), Some("expired meter"));
    assert_eq!(res.preview_value(1, "note"), Some("NULL"));
    assert_eq!(res.preview_value(2, "note"), Some("street cleaning"));
    assert_eq!(res.preview_value(2, "ms"), Some("1600000120500"));

    session.close()?;
    Ok(())
}

#[test]
fn replace_mode_reloads_and_create_mode_refuses() -> TestResult {
    let tmp = TempDir::new()?;
    let (session, parquet) = load_tickets(&tmp, 50)?;
    let frame = Frame::read_parquet(&parquet)?;

    assert_eq!(
        session.create_table_from_frame(TABLE, &frame, CreateMode::Replace)?,
        50
    );

    match session.create_table_from_frame(TABLE, &frame, CreateMode::Create) {
        Err(DuckwalkError::Query { sql, .. }) => assert!(sql.starts_with("CREATE TABLE")),
        other => panic!("unexpected result: {other:?}"),
    }

    session.close()?;
    Ok(())
}

#[test]
fn summarize_table_file_and_projection() -> TestResult {
    let tmp = TempDir::new()?;
    let (session, parquet) = load_tickets(&tmp, 120)?;
    let opts = QueryOpts::default();

    let summary = session.summarize(&Source::Table(TABLE.to_string()), &opts)?;
    assert_eq!(summary.total_rows, 5);
    assert!(summary.columns.iter().any(|c| c == "approx_unique"));
    assert!(summary.columns.iter().any(|c| c == "null_percentage"));

    session.execute(&format!(
        "CREATE TABLE cpt_summary AS SELECT * FROM ({})",
        Source::Table(TABLE.to_string()).summarize_sql()
    ))?;
    assert_eq!(session.row_count("cpt_summary")?, 5);

    let projection = summarize_projection_sql(
        &["Community_Name".to_string(), "Per_capita_income".to_string()],
        &parquet,
    );
    let projected = session.sql(&projection, &opts)?;
    assert_eq!(projected.total_rows, 2);
    assert_eq!(projected.preview_value(0, "column_name"), Some("Community_Name"));

    let from_file = session.summarize(&Source::file(&parquet), &opts)?;
    assert_eq!(from_file.total_rows, 5);

    session.close()?;
    Ok(())
}

#[test]
fn table_reads_parquet_in_place() -> TestResult {
    let tmp = TempDir::new()?;
    let parquet = tmp.path().join("tickets.parquet");
    write_ticket_parquet(&parquet, 30)?;

    let session = Session::open_in_memory()?;
    let res = session.table(&parquet.to_string_lossy(), &QueryOpts::with_max_rows(3))?;
    assert_eq!(res.total_rows, 30);
    assert_eq!(res.preview_rows.len(), 3);
    assert_eq!(res.preview_value(0, "Community_Name"), Some(COMMUNITIES[0].0));
    session.close()?;
    Ok(())
}

#[test]
fn query_output_exports_every_row() -> TestResult {
    let tmp = TempDir::new()?;
    let (session, _) = load_tickets(&tmp, 40)?;

    let out = tmp.path().join("out/tickets.jsonl");
    let opts = QueryOpts {
        max_rows: 2,
        output: Some(out.clone()),
        format: OutputFormat::Jsonl,
        ..QueryOpts::default()
    };
    let res = session.table(TABLE, &opts)?;
    assert_eq!(res.preview_rows.len(), 2);

    let text = std::fs::read_to_string(&out)?;
    assert_eq!(text.lines().count(), 40);

    session.close()?;
    Ok(())
}
