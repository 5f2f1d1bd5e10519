//! SQL text helpers: quoting, source expressions and Arrow to DuckDB type mapping.
//!
//! Everything interpolated into SQL goes through [`quote_identifier`] or
//! [`quote_literal`]; nothing in this crate builds statements by splicing raw
//! user strings, apart from [`Source::Query`] which is SQL by definition.

use std::path::Path;

use arrow::datatypes::{DataType, Schema, TimeUnit};

use crate::error::{CoreResult, UnsupportedTypeSnafu};

/// File extensions DuckDB can scan directly with `FROM '<path>'`.
const FILE_EXTENSIONS: &[&str] = &["parquet", "csv", "json", "jsonl", "ndjson"];

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

/// Quote a string literal with single quotes, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    let escaped = value.replace('\'', "''");
    format!("'{escaped}'")
}

/// True if `name` looks like a path to a columnar file rather than a table name.
pub fn is_file_source(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            FILE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Something a query can read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A table in the session's catalog.
    Table(String),
    /// A columnar file scanned in place.
    File(String),
    /// An arbitrary `SELECT` statement.
    Query(String),
}

impl Source {
    /// Classify raw user input: queries start with `SELECT`/`FROM`/`WITH`,
    /// file paths carry a known extension, everything else is a table name.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let head = trimmed
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        if matches!(head.as_str(), "SELECT" | "FROM" | "WITH") {
            Source::Query(trimmed.to_string())
        } else if is_file_source(trimmed) {
            Source::File(trimmed.to_string())
        } else {
            Source::Table(trimmed.to_string())
        }
    }

    /// File source from a filesystem path.
    pub fn file(path: &Path) -> Self {
        Source::File(path.to_string_lossy().into_owned())
    }

    /// Expression usable after `FROM`.
    pub fn from_clause(&self) -> String {
        match self {
            Source::Table(name) => quote_identifier(name),
            Source::File(path) => quote_literal(path),
            Source::Query(sql) => format!("({sql})"),
        }
    }

    /// A statement returning every row of the source.
    pub fn select_all(&self) -> String {
        match self {
            Source::Query(sql) => sql.clone(),
            other => format!("SELECT * FROM {}", other.from_clause()),
        }
    }

    /// `SUMMARIZE` statement over the source.
    pub fn summarize_sql(&self) -> String {
        match self {
            Source::Table(name) => format!("SUMMARIZE {}", quote_identifier(name)),
            other => format!("SUMMARIZE {}", other.select_all()),
        }
    }

    /// `DESCRIBE` statement over the source.
    pub fn describe_sql(&self) -> String {
        match self {
            Source::Table(name) => format!("DESCRIBE {}", quote_identifier(name)),
            other => format!("DESCRIBE {}", other.select_all()),
        }
    }
}

/// How `CREATE TABLE` treats an existing table of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Fail if the table exists.
    Create,
    /// Drop and recreate.
    Replace,
}

impl CreateMode {
    fn keyword(self) -> &'static str {
        match self {
            CreateMode::Create => "CREATE TABLE",
            CreateMode::Replace => "CREATE OR REPLACE TABLE",
        }
    }
}

/// DuckDB column type for an Arrow type, or `None` if the appender path
/// cannot carry it.
///
/// Times and timestamps map to the microsecond DuckDB types; frames are
/// normalized to that unit (and to plain offsets) before appending.
pub fn duckdb_type(data_type: &DataType) -> Option<String> {
    let name = match data_type {
        DataType::Boolean => "BOOLEAN",
        DataType::Int8 => "TINYINT",
        DataType::Int16 => "SMALLINT",
        DataType::Int32 => "INTEGER",
        DataType::Int64 => "BIGINT",
        DataType::UInt8 => "UTINYINT",
        DataType::UInt16 => "USMALLINT",
        DataType::UInt32 => "UINTEGER",
        DataType::UInt64 => "UBIGINT",
        DataType::Float16 | DataType::Float32 => "FLOAT",
        DataType::Float64 => "DOUBLE",
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => "VARCHAR",
        DataType::Binary
        | DataType::LargeBinary
        | DataType::BinaryView
        | DataType::FixedSizeBinary(_) => "BLOB",
        DataType::Date32 | DataType::Date64 => "DATE",
        DataType::Time32(_) | DataType::Time64(_) => "TIME",
        DataType::Timestamp(_, None) => "TIMESTAMP",
        DataType::Timestamp(_, Some(_)) => "TIMESTAMPTZ",
        DataType::Decimal128(precision, scale) if *precision <= 38 => {
            return Some(format!("DECIMAL({precision}, {scale})"));
        }
        DataType::Dictionary(_, value) => return duckdb_type(value),
        _ => return None,
    };
    Some(name.to_string())
}

/// `CREATE TABLE` statement whose columns mirror `schema` in order.
pub fn create_table_sql(table: &str, schema: &Schema, mode: CreateMode) -> CoreResult<String> {
    let mut columns = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let Some(ty) = duckdb_type(field.data_type()) else {
            return UnsupportedTypeSnafu {
                column: field.name().to_string(),
                data_type: field.data_type().clone(),
            }
            .fail();
        };
        columns.push(format!("{} {ty}", quote_identifier(field.name())));
    }

    Ok(format!(
        "{} {} ({})",
        mode.keyword(),
        quote_identifier(table),
        columns.join(", ")
    ))
}

/// `SUMMARIZE` over a projection of a columnar file.
pub fn summarize_projection_sql(columns: &[String], file: &Path) -> String {
    let projection = if columns.is_empty() {
        "*".to_string()
    } else {
        columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "SUMMARIZE SELECT {projection} FROM {}",
        Source::file(file).from_clause()
    )
}
