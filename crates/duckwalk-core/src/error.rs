//! Error type shared by every module of the core crate.

use arrow::{datatypes::DataType, error::ArrowError};
use parquet::errors::ParquetError;
use snafu::Snafu;

/// Convenience alias for results produced by this crate.
pub type CoreResult<T> = Result<T, DuckwalkError>;

/// Errors raised while driving a DuckDB session.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DuckwalkError {
    /// DuckDB refused to open the database.
    #[snafu(display("Failed to open session on {target}"))]
    OpenSession {
        /// Display form of the session target.
        target: String,
        /// Underlying DuckDB error.
        source: duckdb::Error,
    },

    /// DuckDB reported an error while closing the connection.
    #[snafu(display("Failed to close session on {target}"))]
    CloseSession {
        /// Display form of the session target.
        target: String,
        /// Underlying DuckDB error.
        source: duckdb::Error,
    },

    /// A statement failed to prepare or execute.
    #[snafu(display("Query failed: {sql}"))]
    Query {
        /// The SQL text that was sent to DuckDB.
        sql: String,
        /// Underlying DuckDB error.
        source: duckdb::Error,
    },

    /// The directory holding a file-backed database could not be created.
    #[snafu(display("Failed to create directory: {path}"))]
    CreateDataDir {
        /// Directory path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The Parquet input could not be opened.
    #[snafu(display("Parquet file not found or not accessible: {path}"))]
    OpenParquet {
        /// Path of the Parquet file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The Parquet footer or pages could not be decoded.
    #[snafu(display("Failed to read parquet file {path}"))]
    ReadParquet {
        /// Path of the Parquet file.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// Generic Arrow failure (casts, formatting, writers).
    #[snafu(display("Arrow operation failed"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// A frame column has no DuckDB column type we can create.
    #[snafu(display("Column {column} has unsupported type {data_type} for table creation"))]
    UnsupportedType {
        /// Column name.
        column: String,
        /// Arrow type of the column.
        data_type: DataType,
    },

    /// CSV export was requested for a result with nested columns.
    #[snafu(display("CSV output does not support column {field} of type {data_type}"))]
    CsvUnsupportedType {
        /// Column name.
        field: String,
        /// Debug form of the Arrow type.
        data_type: String,
    },

    /// Writing exported rows or rendered output failed.
    #[snafu(display("Failed to write output {path}"))]
    WriteOutput {
        /// Destination, or `<stdout>`.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Bulk appending frame batches into a table failed.
    #[snafu(display("Failed to append frame into table {table}"))]
    Appender {
        /// Destination table.
        table: String,
        /// Underlying DuckDB error.
        source: duckdb::Error,
    },
}
