//! Bulk meter snapshot.

use async_trait::async_trait;

use super::{ColumnType, Report, ReportBuilder, ReportContext};
use crate::error::Result;
use crate::models::{BulkMeter, MeterLocation};
use crate::output::{local_time, number, text};
use crate::pagination::ErrorPolicy;
use crate::traits::Get;

/// Latest value of every meter, optionally with its service address.
#[derive(Debug, Clone, Default)]
pub struct BulkReport {
    /// Look up each meter's location (one extra request per meter).
    pub detailed: bool,
}

#[async_trait]
impl ReportBuilder for BulkReport {
    fn name(&self) -> &'static str {
        "bulk"
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        use ColumnType::{Number, Text};

        let meters = BulkMeter::snapshot(ctx.client, ctx.page_limit, ErrorPolicy::Continue).await?;
        tracing::info!("building information for {} meters", meters.len());

        let mut report = if self.detailed {
            Report::new(
                "Bulk meter download",
                &[
                    ("ID", Text),
                    ("Type", Text),
                    ("Address", Text),
                    ("City", Text),
                    ("Postal Code", Text),
                    ("Latest Timestamp", Text),
                    ("Latest Value", Number),
                ],
            )
        } else {
            Report::new(
                "Bulk meter download",
                &[
                    ("ID", Text),
                    ("Type", Text),
                    ("Latest Timestamp", Text),
                    ("Latest Value", Number),
                ],
            )
        };

        for meter in meters {
            let timestamp = meter.timestamp.map(local_time).unwrap_or_default();
            let value = number(meter.value);
            let meter_type = text(meter.meter_type.as_deref());

            if !self.detailed {
                report.push(vec![meter.meter_id, meter_type, timestamp, value]);
                continue;
            }

            ctx.progress.tick();
            match MeterLocation::get(ctx.client, meter.meter_id.clone()).await {
                Ok(location) => report.push(vec![
                    meter.meter_id,
                    meter_type,
                    text(location.street_address.as_deref()),
                    text(location.city_town.as_deref()),
                    location.padded_postal_code(),
                    timestamp,
                    value,
                ]),
                Err(e) => {
                    tracing::warn!(meter_id = %meter.meter_id, error = %e, "location lookup failed, skipping meter");
                }
            }
        }

        Ok(report)
    }
}
