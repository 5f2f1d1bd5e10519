//! DuckDB sessions: in-memory or file-backed connections with explicit or
//! scoped release.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Instant,
};

use arrow::{
    array::RecordBatch, datatypes::SchemaRef, util::pretty::pretty_format_batches,
};
use duckdb::{Connection, params};
use snafu::ResultExt;
use tracing::{debug, info};

use crate::{
    error::{
        AppenderSnafu, ArrowSnafu, CloseSessionSnafu, CoreResult, CreateDataDirSnafu,
        OpenSessionSnafu, QuerySnafu,
    },
    frame::Frame,
    output::write_batches,
    render::{QueryOpts, QueryResult},
    sql::{CreateMode, Source, create_table_sql, quote_identifier},
};

/// Where a session keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTarget {
    /// Transient database discarded on close.
    InMemory,
    /// Database persisted in a single file.
    File(PathBuf),
}

impl SessionTarget {
    /// `:memory:` (or an empty string) selects an in-memory database,
    /// anything else is a path.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | ":memory:" => SessionTarget::InMemory,
            path => SessionTarget::File(PathBuf::from(path)),
        }
    }
}

impl fmt::Display for SessionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionTarget::InMemory => f.write_str(":memory:"),
            SessionTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An open DuckDB connection.
///
/// Dropping a session releases the connection as well; [`Session::close`]
/// exists so close failures are reported instead of swallowed.
pub struct Session {
    conn: Connection,
    target: SessionTarget,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a connection. File targets get their parent directory created.
    pub fn open(target: SessionTarget) -> CoreResult<Self> {
        let conn = match &target {
            SessionTarget::InMemory => {
                Connection::open_in_memory().context(OpenSessionSnafu {
                    target: target.to_string(),
                })?
            }
            SessionTarget::File(path) => {
                ensure_parent_dir(path)?;
                Connection::open(path).context(OpenSessionSnafu {
                    target: target.to_string(),
                })?
            }
        };

        info!(db = %target, "opened session");
        Ok(Self { conn, target })
    }

    /// Shorthand for an in-memory session.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open(SessionTarget::InMemory)
    }

    /// Open a session, hand it to `f`, and close it whatever `f` returns.
    ///
    /// An error from `f` takes precedence over an error from closing.
    pub fn scoped<T, E, F>(target: SessionTarget, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Session) -> Result<T, E>,
        E: From<crate::error::DuckwalkError>,
    {
        let mut session = Session::open(target)?;
        let out = f(&mut session);
        let closed = session.close();
        let value = out?;
        closed?;
        Ok(value)
    }

    /// Release the connection, surfacing any error DuckDB reports.
    pub fn close(self) -> CoreResult<()> {
        let target = self.target;
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context(CloseSessionSnafu {
                target: target.to_string(),
            })?;
        info!(db = %target, "closed session");
        Ok(())
    }

    /// Where this session keeps its data.
    pub fn target(&self) -> &SessionTarget {
        &self.target
    }

    /// Borrow the raw connection for calls this type does not wrap.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run a statement and return the affected row count.
    pub fn execute(&self, sql: &str) -> CoreResult<usize> {
        debug!(db = %self.target, sql, "execute");
        self.conn.execute(sql, []).context(QuerySnafu { sql })
    }

    /// Run several `;`-separated statements that return no rows.
    pub fn execute_batch(&self, sql: &str) -> CoreResult<()> {
        debug!(db = %self.target, sql, "execute batch");
        self.conn.execute_batch(sql).context(QuerySnafu { sql })
    }

    /// Run a query and collect every result batch.
    pub fn query_batches(&self, sql: &str) -> CoreResult<(SchemaRef, Vec<RecordBatch>)> {
        debug!(db = %self.target, sql, "query");
        let mut stmt = self.conn.prepare(sql).context(QuerySnafu { sql })?;
        let arrow = stmt.query_arrow([]).context(QuerySnafu { sql })?;
        let schema = arrow.get_schema();
        let batches: Vec<RecordBatch> = arrow.collect();
        Ok((schema, batches))
    }

    /// Run a query and build a bounded preview, exporting every row when
    /// `opts.output` is set.
    pub fn sql(&self, sql: &str, opts: &QueryOpts) -> CoreResult<QueryResult> {
        let plan = if opts.explain {
            Some(self.explain(sql)?)
        } else {
            None
        };

        let start = Instant::now();
        let (schema, batches) = self.query_batches(sql)?;

        let columns = schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        let mut res = QueryResult::from_batches(columns, &batches, opts.max_rows)?;

        if let Some(path) = &opts.output {
            write_batches(path, opts.format, schema.as_ref(), &batches)?;
            info!(path = %path.display(), rows = res.total_rows, "exported query result");
        }

        res.elapsed = opts.timing.then(|| start.elapsed());
        res.plan = plan;
        Ok(res)
    }

    /// Every row of a table, or of a columnar file when `name` is a path.
    pub fn table(&self, name: &str, opts: &QueryOpts) -> CoreResult<QueryResult> {
        self.sql(&table_source(name).select_all(), opts)
    }

    /// Column names and types of a source.
    pub fn describe(&self, source: &Source, opts: &QueryOpts) -> CoreResult<QueryResult> {
        self.sql(&source.describe_sql(), opts)
    }

    /// Per-column descriptive statistics of a source.
    pub fn summarize(&self, source: &Source, opts: &QueryOpts) -> CoreResult<QueryResult> {
        self.sql(&source.summarize_sql(), opts)
    }

    /// Rendered `EXPLAIN` output for `sql`.
    pub fn explain(&self, sql: &str) -> CoreResult<String> {
        let (_, batches) = self.query_batches(&format!("EXPLAIN {sql}"))?;
        let rendered = pretty_format_batches(&batches).context(ArrowSnafu)?;
        Ok(rendered.to_string())
    }

    /// Whether a table or view named `name` exists in the session.
    pub fn table_exists(&self, name: &str) -> CoreResult<bool> {
        let sql = "SELECT count(*) FROM information_schema.tables WHERE lower(table_name) = lower(?)";
        let count: i64 = self
            .conn
            .query_row(sql, params![name], |row| row.get(0))
            .context(QuerySnafu { sql })?;
        Ok(count > 0)
    }

    /// Create `table` with the frame's schema and append every batch.
    ///
    /// Returns the row count of the loaded table.
    pub fn create_table_from_frame(
        &self,
        table: &str,
        frame: &Frame,
        mode: CreateMode,
    ) -> CoreResult<usize> {
        let frame = frame.normalized()?;
        let ddl = create_table_sql(table, frame.schema(), mode)?;
        self.execute(&ddl)?;

        {
            // The appender flushes its buffered chunks when dropped.
            let mut appender = self
                .conn
                .appender(table)
                .context(AppenderSnafu { table })?;
            for batch in frame.batches() {
                appender
                    .append_record_batch(batch.clone())
                    .context(AppenderSnafu { table })?;
            }
        }

        let rows = self.row_count(table)?;
        info!(table, rows, expected = frame.num_rows(), "created table from frame");
        Ok(rows)
    }

    /// `count(*)` of a table.
    pub fn row_count(&self, table: &str) -> CoreResult<usize> {
        let sql = format!("SELECT count(*) FROM {}", quote_identifier(table));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .context(QuerySnafu { sql: sql.as_str() })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// File paths become scans, anything else is a table name.
fn table_source(name: &str) -> Source {
    if crate::sql::is_file_source(name) {
        Source::File(name.to_string())
    } else {
        Source::Table(name.to_string())
    }
}

fn ensure_parent_dir(path: &Path) -> CoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).context(CreateDataDirSnafu {
                path: parent.display().to_string(),
            })
        }
        _ => Ok(()),
    }
}
