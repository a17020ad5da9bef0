//! Enterprise-wide usage.

use async_trait::async_trait;
use chrono_tz::Tz;

use super::{ColumnType, Report, ReportBuilder, ReportContext};
use crate::chunking::{offset_for, window_for, DateRange};
use crate::error::Result;
use crate::models::UsageChunk;
use crate::output::{number, zoned_time};

/// Usage summed over all meters, one row per sample.
#[derive(Debug, Clone)]
pub struct AggregateUsageReport {
    pub range: DateRange,
    pub granularity: String,
}

#[async_trait]
impl ReportBuilder for AggregateUsageReport {
    fn name(&self) -> &'static str {
        "usage"
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        use ColumnType::{Number, Text};

        let tz = ctx.client.timezone().unwrap_or(Tz::UTC);
        let window = window_for(self.range, offset_for(tz, self.range.start));
        let usage =
            UsageChunk::fetch_aggregate(ctx.client, &self.granularity, window.start, window.end).await?;

        let mut report = Report::new(
            format!(
                "Aggregate usage {} through {} (sum {})",
                self.range.start,
                self.range.end,
                number(usage.sum_usage)
            ),
            &[("Timestamp", Text), ("Energy", Number), ("Power", Number)],
        );
        for sample in usage.results {
            report.push(vec![
                zoned_time(sample.time, tz),
                number(sample.value),
                number(sample.power),
            ]);
        }
        Ok(report)
    }
}
