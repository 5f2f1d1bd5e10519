//! Thin, typed glue for walking through DuckDB from Rust.
//!
//! The engine work (SQL, Parquet scans, `SUMMARIZE`, `DESCRIBE`) all happens
//! inside DuckDB. This crate only adds:
//!
//! - [`Session`]: in-memory or file-backed connections with explicit or
//!   scoped release (`session` module).
//! - [`Frame`]: Parquet read into Arrow record batches, used as the
//!   intermediary when loading a file into a table (`frame` module).
//! - SQL helpers for quoting, source expressions and Arrow to DuckDB type
//!   mapping (`sql` module).
//! - Bounded result previews and CSV/JSONL export (`render`, `output`).
#![deny(missing_docs)]

pub mod error;
pub mod frame;
pub mod output;
pub mod render;
pub mod session;
pub mod sql;

pub use error::{CoreResult, DuckwalkError};
pub use frame::Frame;
pub use output::OutputFormat;
pub use render::{PreviewState, QueryOpts, QueryResult, print_query_result, write_query_result};
pub use session::{Session, SessionTarget};
pub use sql::{CreateMode, Source};
