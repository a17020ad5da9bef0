//! Report builders.
//!
//! Every CLI command maps to one [`ReportBuilder`]. A builder fetches what it
//! needs through the client and returns a [`Report`]: a title, a header, rows
//! of display strings and a type per column. Rendering is left to
//! [`crate::output`].

mod app;
mod bulk;
mod entities;
mod grid;
mod meter_data;
mod usage;

pub use app::{AppDetailReport, AppSummaryReport};
pub use bulk::BulkReport;
pub use entities::{GatewayListReport, MeterListReport, PremiseListReport};
pub use grid::{GridLatestReport, GridReadingsReport};
pub use meter_data::{MeterReadingsReport, MeterUsageReport};
pub use usage::AggregateUsageReport;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::client::CopperClient;
use crate::config::AuthFlow;
use crate::error::Result;
use crate::progress::Progress;

/// How a column is aligned when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Number,
}

/// Tabular result of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub column_types: Vec<ColumnType>,
}

impl Report {
    /// An empty report with the given columns.
    pub fn new(title: impl Into<String>, columns: &[(&str, ColumnType)]) -> Self {
        Self {
            title: title.into(),
            header: columns.iter().map(|(name, _)| (*name).to_string()).collect(),
            rows: Vec::new(),
            column_types: columns.iter().map(|(_, kind)| *kind).collect(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Everything a builder may use while running.
pub struct ReportContext<'a> {
    pub client: &'a CopperClient,
    /// Page size for listings and the bulk snapshot.
    pub page_limit: u32,
    pub progress: &'a dyn Progress,
}

/// Produces one report.
#[async_trait]
pub trait ReportBuilder: Send + Sync {
    /// Command name, used in logs.
    fn name(&self) -> &'static str;

    /// OAuth flow the report's endpoints require.
    fn flow(&self) -> AuthFlow {
        AuthFlow::Enterprise
    }

    /// Fetch the data and build the report.
    ///
    /// # Errors
    ///
    /// Returns an error if a request the report cannot do without fails.
    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report>;
}

/// Per-meter output file; `:` in the meter id becomes `_`.
pub(crate) fn meter_file(output_dir: &Path, meter_id: &str) -> PathBuf {
    output_dir.join(format!("{}.csv", crate::models::file_stem(meter_id)))
}
