//! Human-facing rendering of query results.

use std::{io::Write, path::PathBuf, time::Duration};

use arrow::{
    array::RecordBatch,
    error::ArrowError,
    util::display::{ArrayFormatter, FormatOptions},
};
use snafu::ResultExt;
use tabled::{
    builder::Builder,
    settings::{Style, object::Rows, style::LineText, width::MinWidth},
};

use crate::{
    error::{ArrowSnafu, CoreResult, WriteOutputSnafu},
    output::OutputFormat,
};

/// Options controlling how a query is run and shown.
#[derive(Debug, Clone)]
pub struct QueryOpts {
    /// Also capture the `EXPLAIN` plan.
    pub explain: bool,
    /// Record elapsed wall time.
    pub timing: bool,
    /// Maximum rows kept for the preview; `0` suppresses it.
    pub max_rows: usize,
    /// Export every row here as well.
    pub output: Option<PathBuf>,
    /// Format used for `output`.
    pub format: OutputFormat,
}

impl Default for QueryOpts {
    fn default() -> Self {
        Self {
            explain: false,
            timing: false,
            max_rows: 10,
            output: None,
            format: OutputFormat::Csv,
        }
    }
}

impl QueryOpts {
    /// Defaults with a different preview cap.
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            max_rows,
            ..Self::default()
        }
    }
}

/// Outcome of one query: a bounded preview plus counts.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Result column names.
    pub columns: Vec<String>,
    /// Stringified leading rows, nulls shown as `NULL`.
    pub preview_rows: Vec<Vec<String>>,
    /// Rows in the full result.
    pub total_rows: u64,
    /// Wall time, when `timing` was requested.
    pub elapsed: Option<Duration>,
    /// Rendered physical plan when `explain` was requested.
    pub plan: Option<String>,
}

impl QueryResult {
    /// Build a result from collected batches, keeping at most `max_rows`
    /// stringified rows.
    pub(crate) fn from_batches(
        columns: Vec<String>,
        batches: &[RecordBatch],
        max_rows: usize,
    ) -> CoreResult<Self> {
        let options = FormatOptions::default().with_null("NULL");
        let mut preview_rows_left = max_rows;
        let mut preview_rows = Vec::new();
        let mut total_rows: u64 = 0;

        for batch in batches {
            total_rows += batch.num_rows() as u64;
            if preview_rows_left == 0 {
                continue;
            }

            let formatters = batch
                .columns()
                .iter()
                .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
                .collect::<Result<Vec<_>, ArrowError>>()
                .context(ArrowSnafu)?;

            let rows_to_take = preview_rows_left.min(batch.num_rows());
            for row_idx in 0..rows_to_take {
                let mut row = Vec::with_capacity(formatters.len());
                for formatter in &formatters {
                    row.push(
                        formatter
                            .value(row_idx)
                            .try_to_string()
                            .context(ArrowSnafu)?,
                    );
                }
                preview_rows.push(row);
            }
            preview_rows_left -= rows_to_take;
        }

        Ok(Self {
            columns,
            preview_rows,
            total_rows,
            elapsed: None,
            plan: None,
        })
    }

    /// Value at `(row, column)` in the preview, by column name.
    pub fn preview_value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.preview_rows.get(row)?.get(idx).map(String::as_str)
    }
}

/// Box-drawn table with `title` embedded in the top border.
pub fn render_table(title: &str, columns: &[String], rows: &[Vec<String>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    const TITLE_OFFSET: usize = 2;
    let min_width = TITLE_OFFSET + title.chars().count() + 4;

    let mut builder = Builder::default();
    builder.push_record(columns);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.with(MinWidth::new(min_width));
    if !title.is_empty() {
        table.with(LineText::new(title, Rows::first()).offset(TITLE_OFFSET));
        // LineText re-estimates dimensions, so re-apply MinWidth afterwards.
        table.with(MinWidth::new(min_width));
    }
    table.to_string()
}

/// How the preview relates to the full result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    /// Every row made it into the preview.
    Complete,
    /// Only the first `shown` of `total` rows are in the preview.
    Partial {
        /// Rows in the preview.
        shown: u64,
        /// Rows in the full result.
        total: u64,
    },
    /// The result has no rows.
    Empty,
    /// Rows exist but the preview was turned off with `max_rows == 0`.
    Suppressed,
}

impl PreviewState {
    /// Line printed under the table, if the preview needs explaining.
    pub fn note(self) -> Option<String> {
        match self {
            PreviewState::Complete => None,
            PreviewState::Partial { shown, total } => {
                Some(format!("({shown} of {total} rows shown)"))
            }
            PreviewState::Empty => Some("(no rows)".to_string()),
            PreviewState::Suppressed => {
                Some("(preview suppressed; use --max-rows > 0)".to_string())
            }
        }
    }
}

impl QueryResult {
    /// Classify the preview against the row count, given the `max_rows` it
    /// was built with.
    pub fn preview_state(&self, max_rows: usize) -> PreviewState {
        let shown = self.preview_rows.len() as u64;
        if self.total_rows == 0 {
            PreviewState::Empty
        } else if max_rows == 0 {
            PreviewState::Suppressed
        } else if shown < self.total_rows {
            PreviewState::Partial {
                shown,
                total: self.total_rows,
            }
        } else {
            PreviewState::Complete
        }
    }
}

/// Plan (if any), the titled preview table, the preview note, then the
/// `total_rows` / `elapsed_ms` / `wrote:` lines.
///
/// Statements without result columns (DDL, `INSERT`) skip the table.
pub fn write_query_result<W: Write>(
    title: &str,
    res: &QueryResult,
    opts: &QueryOpts,
    out: &mut W,
) -> CoreResult<()> {
    let state = res.preview_state(opts.max_rows);
    let write = |out: &mut W| -> std::io::Result<()> {
        if let Some(plan) = &res.plan {
            writeln!(out, "{plan}")?;
        }

        if !res.columns.is_empty() {
            writeln!(out, "{}", render_table(title, &res.columns, &res.preview_rows))?;
        }
        if let Some(note) = state.note() {
            writeln!(out, "{note}")?;
        }

        writeln!(out, "total_rows: {}", res.total_rows)?;
        if let Some(elapsed) = res.elapsed {
            writeln!(out, "elapsed_ms: {}", elapsed.as_millis())?;
        }
        if let Some(path) = &opts.output {
            writeln!(out, "wrote: {} ({})", path.display(), opts.format)?;
        }
        Ok(())
    };

    write(out).context(WriteOutputSnafu { path: "<stdout>" })
}

/// [`write_query_result`] to a locked stdout.
pub fn print_query_result(title: &str, res: &QueryResult, opts: &QueryOpts) -> CoreResult<()> {
    let mut stdout = std::io::stdout().lock();
    write_query_result(title, res, opts, &mut stdout)
}
