//! The walkthrough steps. Each one opens its own sessions and releases them
//! before returning.

use std::path::Path;

use duckwalk_core::{
    CreateMode, Frame, QueryOpts, QueryResult, Session, SessionTarget, Source,
    print_query_result,
    sql::{quote_identifier, quote_literal, summarize_projection_sql},
};
use snafu::ResultExt;
use tracing::{info, info_span, warn};

use crate::{
    error::{CliError, CliResult, MissingTableSnafu, StepSnafu},
    paths::DataPaths,
};

pub const CHICAGO_TABLE: &str = "ChicagoParkingTickets";
pub const SUMMARY_TABLE: &str = "cpt_summary";

/// Summaries and descriptions list every column, so they get at least this
/// many preview rows.
const STATS_PREVIEW_ROWS: usize = 50;

pub fn default_summary_columns() -> Vec<String> {
    vec!["Community_Name".to_string(), "Per_capita_income".to_string()]
}

pub struct Walkthrough {
    paths: DataPaths,
    opts: QueryOpts,
    summary_columns: Vec<String>,
}

fn show(title: &str, res: &QueryResult, opts: &QueryOpts) -> CliResult<()> {
    print_query_result(title, res, opts)?;
    println!();
    Ok(())
}

/// Run one step under a tracing span, attributing core failures to it.
fn run_step<F>(name: &'static str, f: F) -> CliResult<()>
where
    F: FnOnce() -> CliResult<()>,
{
    let span = info_span!("step", step = name);
    let _guard = span.enter();

    println!("== {name} ==");
    match f() {
        Err(CliError::Core { source }) => Err(source).context(StepSnafu { step: name }),
        other => {
            info!("step finished");
            other
        }
    }
}

impl Walkthrough {
    pub fn new(paths: DataPaths, opts: QueryOpts, summary_columns: Vec<String>) -> Self {
        Self {
            paths,
            opts,
            summary_columns,
        }
    }

    fn stats_opts(&self) -> QueryOpts {
        QueryOpts {
            max_rows: self.opts.max_rows.max(STATS_PREVIEW_ROWS),
            ..self.opts.clone()
        }
    }

    fn chicago_target(&self) -> SessionTarget {
        SessionTarget::File(self.paths.chicago_db())
    }

    /// In-memory session, one query, explicit close.
    pub fn hello(&self) -> CliResult<()> {
        run_step("hello", || {
            let session = Session::open_in_memory()?;
            let sql = "SELECT 42 AS X";
            let res = session.sql(sql, &self.opts)?;
            show(sql, &res, &self.opts)?;
            session.close()?;
            Ok(())
        })
    }

    /// File-backed session released by scope: create, insert, show.
    ///
    /// The table is replaced on every run so reruns stay at one row.
    pub fn scratch(&self) -> CliResult<()> {
        run_step("scratch", || {
            let target = SessionTarget::File(self.paths.scratch_db());
            Session::scoped(target, |session| -> CliResult<()> {
                session.execute("CREATE OR REPLACE TABLE test (i INTEGER)")?;
                session.execute("INSERT INTO test VALUES (42)")?;
                let res = session.table("test", &self.opts)?;
                show("test", &res, &self.opts)
            })
        })
    }

    /// Parquet into a frame, frame into a table, then a look at the file.
    pub fn load(&self) -> CliResult<()> {
        run_step("load", || {
            let parquet = self.paths.existing_parquet()?;
            let session = Session::open(self.chicago_target())?;

            let frame = Frame::read_parquet(parquet)?;
            println!(
                "read {} rows x {} columns from {}",
                frame.num_rows(),
                frame.schema().fields().len(),
                parquet.display()
            );

            let rows = session.create_table_from_frame(CHICAGO_TABLE, &frame, CreateMode::Replace)?;
            println!("created table {CHICAGO_TABLE} with {rows} rows");
            println!();

            let file = Source::file(parquet);
            let title = parquet.display().to_string();
            let res = session.sql(&file.select_all(), &self.opts)?;
            show(&title, &res, &self.opts)?;

            let stats = self.stats_opts();
            let res = session.describe(&file, &stats)?;
            show(&format!("DESCRIBE {title}"), &res, &stats)?;

            session.close()?;
            Ok(())
        })
    }

    /// `SUMMARIZE` over the loaded table, its materialised copy, and a
    /// projection read straight from the Parquet file.
    pub fn summarize(&self) -> CliResult<()> {
        run_step("summarize", || {
            let db = self.paths.chicago_db();
            if !db.is_file() {
                return MissingTableSnafu {
                    table: CHICAGO_TABLE,
                    db: db.display().to_string(),
                }
                .fail();
            }

            let stats = self.stats_opts();
            Session::scoped(self.chicago_target(), |session| -> CliResult<()> {
                require_loaded(session, &db)?;

                let table = Source::Table(CHICAGO_TABLE.to_string());
                let res = session.summarize(&table, &stats)?;
                show(&table.summarize_sql(), &res, &stats)?;

                session.execute(&format!(
                    "CREATE OR REPLACE TABLE {} AS SELECT * FROM ({})",
                    quote_identifier(SUMMARY_TABLE),
                    table.summarize_sql()
                ))?;
                println!(
                    "created table {SUMMARY_TABLE} with {} rows",
                    session.row_count(SUMMARY_TABLE)?
                );
                println!();

                self.summarize_projection(session, &stats)
            })
        })
    }

    fn summarize_projection(&self, session: &Session, stats: &QueryOpts) -> CliResult<()> {
        let parquet = self.paths.parquet();
        if !parquet.is_file() {
            warn!(path = %parquet.display(), "parquet file missing; skipping projection summary");
            return Ok(());
        }

        let sql = summarize_projection_sql(&self.summary_columns, parquet);
        let res = session.sql(&sql, stats)?;
        show(&sql, &res, stats)
    }

    /// Delete rows matching `predicate`, then reclaim space.
    pub fn vacuum(&self, predicate: &str) -> CliResult<()> {
        run_step("vacuum", || {
            let db = self.paths.chicago_db();
            Session::scoped(self.chicago_target(), |session| -> CliResult<()> {
                require_loaded(session, &db)?;
                let table = quote_identifier(CHICAGO_TABLE);
                let deleted = session.execute(&format!("DELETE FROM {table} WHERE {predicate}"))?;
                session.execute_batch("VACUUM; CHECKPOINT;")?;
                println!(
                    "deleted {deleted} rows; {} rows remain in {CHICAGO_TABLE}",
                    session.row_count(CHICAGO_TABLE)?
                );
                Ok(())
            })
        })
    }

    /// Query the materialised summary with its plan, then export it.
    pub fn explain_and_export(&self) -> CliResult<()> {
        run_step("explain", || {
            Session::scoped(self.chicago_target(), |session| -> CliResult<()> {
                let sql = format!(
                    "SELECT column_name, column_type, approx_unique, null_percentage \
                     FROM {} ORDER BY approx_unique DESC",
                    quote_identifier(SUMMARY_TABLE)
                );
                let opts = QueryOpts {
                    explain: true,
                    ..self.stats_opts()
                };
                let res = session.sql(&sql, &opts)?;
                show(&sql, &res, &opts)?;

                let export = self.paths.summary_export();
                export_parquet(session, SUMMARY_TABLE, &export)?;
                println!("exported {SUMMARY_TABLE} to {}", export.display());
                Ok(())
            })
        })
    }

    /// Every step in order.
    pub fn tour(&self) -> CliResult<()> {
        self.hello()?;
        self.scratch()?;
        self.load()?;
        self.summarize()?;
        self.explain_and_export()
    }
}

fn require_loaded(session: &Session, db: &Path) -> CliResult<()> {
    if session.table_exists(CHICAGO_TABLE)? {
        return Ok(());
    }
    MissingTableSnafu {
        table: CHICAGO_TABLE,
        db: db.display().to_string(),
    }
    .fail()
}

fn export_parquet(session: &Session, table: &str, dest: &Path) -> CliResult<()> {
    session.execute(&format!(
        "COPY {} TO {} (FORMAT PARQUET)",
        quote_identifier(table),
        quote_literal(&dest.to_string_lossy())
    ))?;
    Ok(())
}

/// Ad hoc SQL against any database.
pub fn query(target: SessionTarget, sql: &str, opts: &QueryOpts) -> CliResult<()> {
    let session = Session::open(target)?;
    let res = session.sql(sql, opts)?;
    print_query_result(sql, &res, opts)?;
    session.close()?;
    Ok(())
}
