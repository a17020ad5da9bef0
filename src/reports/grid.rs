//! Grid telemetry reports.

use async_trait::async_trait;
use chrono_tz::Tz;

use super::{ColumnType, Report, ReportBuilder, ReportContext};
use crate::chunking::{offset_for, window_for, DateRange};
use crate::error::Result;
use crate::models::GridReading;
use crate::output::{local_time, number, text};

fn grid_report(title: String, readings: Vec<GridReading>) -> Report {
    use ColumnType::{Number, Text};

    let mut report = Report::new(
        title,
        &[
            ("Gateway", Text),
            ("Timestamp", Text),
            ("Voltage", Number),
            ("Frequency", Number),
        ],
    );
    for reading in readings {
        report.push(vec![
            text(reading.gateway_id.as_deref()),
            reading.time.map(local_time).unwrap_or_default(),
            number(reading.voltage),
            number(reading.frequency),
        ]);
    }
    report
}

/// Most recent grid reading of every gateway.
#[derive(Debug, Clone, Default)]
pub struct GridLatestReport;

#[async_trait]
impl ReportBuilder for GridLatestReport {
    fn name(&self) -> &'static str {
        "grid latest"
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        let readings = GridReading::latest(ctx.client).await?;
        Ok(grid_report("Latest grid readings".to_string(), readings))
    }
}

/// Grid readings over a date range.
///
/// Dates are read in the configured timezone, or UTC.
#[derive(Debug, Clone)]
pub struct GridReadingsReport {
    pub range: DateRange,
}

#[async_trait]
impl ReportBuilder for GridReadingsReport {
    fn name(&self) -> &'static str {
        "grid readings"
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        let tz = ctx.client.timezone().unwrap_or(Tz::UTC);
        let window = window_for(self.range, offset_for(tz, self.range.start));
        let readings = GridReading::readings(ctx.client, window.start, window.end).await?;
        Ok(grid_report(
            format!("Grid readings {} through {}", self.range.start, self.range.end),
            readings,
        ))
    }
}
