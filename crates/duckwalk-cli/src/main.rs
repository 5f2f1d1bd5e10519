//! CLI walking through DuckDB: sessions, tables, Parquet loading and SUMMARIZE.

mod error;
mod paths;
mod steps;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use duckwalk_core::{OutputFormat, QueryOpts, SessionTarget};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    error::CliResult,
    paths::DataPaths,
    steps::{Walkthrough, default_summary_columns},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Csv,
    Jsonl,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(v: OutputFormatArg) -> Self {
        match v {
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// In-memory session: SELECT 42 AS X
    Hello,

    /// File-backed scratch database: create, insert and show table `test`
    Scratch,

    /// Load the Parquet file into ChicagoParkingTickets and describe it
    Load,

    /// SUMMARIZE the loaded table, materialise cpt_summary, summarize a projection
    Summarize {
        /// Columns for the projection summary (repeatable)
        #[arg(long = "column")]
        columns: Vec<String>,
    },

    /// Delete matching rows from ChicagoParkingTickets, then VACUUM and CHECKPOINT
    Vacuum {
        /// SQL predicate, e.g. "Per_capita_income IS NULL"
        #[arg(long = "where")]
        predicate: String,
    },

    /// Run every step in order, then explain and export the summary
    Tour,

    /// Execute ad hoc SQL
    Query {
        /// Database file, or :memory:
        #[arg(long, default_value = ":memory:")]
        db: String,

        #[arg(long)]
        sql: String,

        #[arg(long, default_value_t = false)]
        explain: bool,

        #[arg(long, default_value_t = false)]
        timing: bool,

        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormatArg::Csv)]
        format: OutputFormatArg,
    },
}

#[derive(Debug, Parser)]
#[command(name = "duckwalk", version, about)]
struct Cli {
    /// Directory holding file.db, chicago.db and the Parquet input
    #[arg(long, global = true, env = "DUCKWALK_DATA_DIR", default_value = "duckdbdata")]
    data_dir: PathBuf,

    /// Parquet input (default: <data-dir>/ChicagoParkingTickets.parquet)
    #[arg(long, global = true, env = "DUCKWALK_PARQUET")]
    parquet: Option<PathBuf>,

    /// Rows shown per result preview
    #[arg(long, global = true, default_value_t = 10)]
    max_rows: usize,

    /// Debug logging for duckwalk (RUST_LOG overrides)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "duckwalk=debug,duckwalk_core=debug"
    } else {
        "duckwalk=warn,duckwalk_core=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> CliResult<()> {
    let paths = DataPaths::new(&cli.data_dir, cli.parquet);
    debug!(?paths, "resolved data paths");
    let opts = QueryOpts::with_max_rows(cli.max_rows);

    let walk = |columns: Vec<String>| {
        let columns = if columns.is_empty() {
            default_summary_columns()
        } else {
            columns
        };
        Walkthrough::new(paths.clone(), opts.clone(), columns)
    };

    match cli.cmd {
        Command::Hello => walk(Vec::new()).hello(),
        Command::Scratch => walk(Vec::new()).scratch(),
        Command::Load => walk(Vec::new()).load(),
        Command::Summarize { columns } => walk(columns).summarize(),
        Command::Vacuum { predicate } => walk(Vec::new()).vacuum(&predicate),
        Command::Tour => walk(Vec::new()).tour(),
        Command::Query {
            db,
            sql,
            explain,
            timing,
            output,
            format,
        } => {
            let opts = QueryOpts {
                explain,
                timing,
                output,
                format: format.into(),
                ..opts.clone()
            };
            steps::query(SessionTarget::parse(&db), &sql, &opts)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
