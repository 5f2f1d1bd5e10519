use duckwalk_core::DuckwalkError;
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Step '{step}' failed"))]
    Step {
        step: &'static str,
        source: DuckwalkError,
    },

    #[snafu(display(
        "Parquet file not found: {path}. \
         Pass --parquet or place ChicagoParkingTickets.parquet under --data-dir."
    ))]
    ParquetMissing { path: String },

    #[snafu(display(
        "Table {table} does not exist in {db}. \
         Run `duckwalk load` first."
    ))]
    MissingTable { table: String, db: String },

    #[snafu(transparent)]
    Core { source: DuckwalkError },
}
