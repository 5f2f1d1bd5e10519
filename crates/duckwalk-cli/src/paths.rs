use std::path::{Path, PathBuf};

use crate::error::{CliResult, ParquetMissingSnafu};

pub const SCRATCH_DB: &str = "file.db";
pub const CHICAGO_DB: &str = "chicago.db";
pub const PARQUET_FILE: &str = "ChicagoParkingTickets.parquet";
pub const SUMMARY_EXPORT: &str = "cpt_summary.parquet";

/// Fixed file layout under the data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    data_dir: PathBuf,
    parquet: PathBuf,
}

impl DataPaths {
    /// `parquet` defaults to `<data_dir>/ChicagoParkingTickets.parquet`.
    pub fn new(data_dir: impl AsRef<Path>, parquet: Option<PathBuf>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        let parquet = parquet.unwrap_or_else(|| data_dir.join(PARQUET_FILE));
        Self { data_dir, parquet }
    }

    pub fn scratch_db(&self) -> PathBuf {
        self.data_dir.join(SCRATCH_DB)
    }

    pub fn chicago_db(&self) -> PathBuf {
        self.data_dir.join(CHICAGO_DB)
    }

    pub fn summary_export(&self) -> PathBuf {
        self.data_dir.join(SUMMARY_EXPORT)
    }

    pub fn parquet(&self) -> &Path {
        &self.parquet
    }

    /// The Parquet input, or a hint on how to provide it.
    pub fn existing_parquet(&self) -> CliResult<&Path> {
        if self.parquet.is_file() {
            Ok(&self.parquet)
        } else {
            ParquetMissingSnafu {
                path: self.parquet.display().to_string(),
            }
            .fail()
        }
    }
}
