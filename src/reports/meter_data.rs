//! Per-meter usage and readings downloads.
//!
//! Each meter gets its own CSV file under the output directory. Meters whose
//! file already exists are skipped, so an interrupted download can be resumed
//! by running the same command again. A series with skipped windows is
//! written as `<meter>.csv.partial` instead, and the meter is fetched again
//! on the next run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{meter_file, ColumnType, Report, ReportBuilder, ReportContext};
use crate::chunking::{fetch_readings_chunked, fetch_usage_chunked, DateRange, UsageOptions};
use crate::config::parse_timezone;
use crate::error::Result;
use crate::models::{EntityListQuery, Meter};
use crate::output::{number, sibling, text, write_csv, zoned_time};
use crate::pagination::ErrorPolicy;
use crate::traits::List;

/// Where a meter's rows go: the final file when complete, else a `.partial`
/// sibling that the existence check ignores.
fn output_path(path: &Path, meter_id: &str, skipped_windows: usize) -> PathBuf {
    if skipped_windows == 0 {
        return path.to_path_buf();
    }
    let partial = sibling(path, ".partial");
    tracing::warn!(
        meter_id,
        skipped_windows,
        path = %partial.display(),
        "download has gaps, writing partial file"
    );
    partial
}

async fn meters_to_fetch(ctx: &ReportContext<'_>) -> Result<Vec<Meter>> {
    let query = EntityListQuery::default();
    let meters = Meter::list_all_with(ctx.client, &query, ctx.page_limit, ErrorPolicy::Abort).await?;
    tracing::info!("collecting data for {} meters", meters.len());
    Ok(meters)
}

/// Chunked usage of every meter.
#[derive(Debug, Clone)]
pub struct MeterUsageReport {
    pub range: DateRange,
    pub options: UsageOptions,
    pub output_dir: PathBuf,
}

#[async_trait]
impl ReportBuilder for MeterUsageReport {
    fn name(&self) -> &'static str {
        "meter usage"
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        use ColumnType::{Number, Text};

        std::fs::create_dir_all(&self.output_dir)?;
        let mut report = Report::new(
            format!(
                "Meter usage download {} through {}",
                self.range.start, self.range.end
            ),
            &[("ID", Text), ("Type", Text), ("Sum Usage", Number)],
        );

        for meter in meters_to_fetch(ctx).await? {
            let path = meter_file(&self.output_dir, &meter.id);
            if path.exists() {
                tracing::info!(meter_id = %meter.id, path = %path.display(), "output exists, skipping meter");
                continue;
            }

            let usage =
                match fetch_usage_chunked(ctx.client, &meter, self.range, &self.options, ctx.progress).await {
                    Ok(usage) => usage,
                    Err(e) if self.options.policy == ErrorPolicy::Continue => {
                        tracing::warn!(meter_id = %meter.id, error = %e, "usage download failed, skipping meter");
                        continue;
                    }
                    Err(e) => return Err(e),
                };

            let tz = parse_timezone(&usage.tz)?;
            let rows = usage.results.iter().map(|sample| {
                [
                    zoned_time(sample.time, tz),
                    number(sample.value),
                    number(sample.power),
                ]
            });
            let target = output_path(&path, &meter.id, usage.skipped_windows);
            write_csv(&target, &["timestamp", "energy", "power"], rows)?;

            report.push(vec![
                usage.meter_id.clone(),
                text(usage.meter_type.as_deref()),
                number(Some(usage.sum_usage)),
            ]);
        }

        Ok(report)
    }
}

/// Chunked readings of every meter.
#[derive(Debug, Clone)]
pub struct MeterReadingsReport {
    pub range: DateRange,
    pub policy: ErrorPolicy,
    pub output_dir: PathBuf,
}

#[async_trait]
impl ReportBuilder for MeterReadingsReport {
    fn name(&self) -> &'static str {
        "meter readings"
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        use ColumnType::{Number, Text};

        std::fs::create_dir_all(&self.output_dir)?;
        let mut report = Report::new(
            format!(
                "Meter readings download {} through {}",
                self.range.start, self.range.end
            ),
            &[("ID", Text), ("Type", Text), ("Readings", Number)],
        );

        for meter in meters_to_fetch(ctx).await? {
            let path = meter_file(&self.output_dir, &meter.id);
            if path.exists() {
                tracing::info!(meter_id = %meter.id, path = %path.display(), "output exists, skipping meter");
                continue;
            }

            let series =
                match fetch_readings_chunked(ctx.client, &meter, self.range, self.policy, ctx.progress).await {
                    Ok(series) => series,
                    Err(e) if self.policy == ErrorPolicy::Continue => {
                        tracing::warn!(meter_id = %meter.id, error = %e, "readings download failed, skipping meter");
                        continue;
                    }
                    Err(e) => return Err(e),
                };

            let rows = series
                .readings
                .iter()
                .map(|reading| [zoned_time(reading.time, series.tz), number(reading.value)]);
            let target = output_path(&path, &meter.id, series.skipped_windows);
            write_csv(&target, &["timestamp", "value"], rows)?;

            report.push(vec![
                series.meter_id.clone(),
                text(meter.meter_type.as_deref()),
                series.readings.len().to_string(),
            ]);
        }

        Ok(report)
    }
}
