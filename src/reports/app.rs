//! Reports over the logged-in user's premises and meters.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use super::{ColumnType, Report, ReportBuilder, ReportContext};
use crate::config::AuthFlow;
use crate::error::Result;
use crate::models::{AppState, UsageChunk};
use crate::output::{number, text, zoned_time};

fn start_of_today() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Latest usage value of every meter on the account, since midnight UTC.
#[derive(Debug, Clone)]
pub struct AppSummaryReport {
    pub granularity: String,
}

impl Default for AppSummaryReport {
    fn default() -> Self {
        Self {
            granularity: "bihour".to_string(),
        }
    }
}

#[async_trait]
impl ReportBuilder for AppSummaryReport {
    fn name(&self) -> &'static str {
        "app summary"
    }

    fn flow(&self) -> AuthFlow {
        AuthFlow::App
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        use ColumnType::{Number, Text};

        let state = AppState::fetch(ctx.client).await?;
        let start = start_of_today();

        let mut report = Report::new(
            "Summary",
            &[
                ("Premise Name", Text),
                ("Meter ID", Text),
                ("Meter Type", Text),
                ("Current Value", Number),
            ],
        );
        for premise in &state.premise_list {
            for meter in &premise.meter_list {
                ctx.progress.tick();
                let usage = match UsageChunk::fetch_app(ctx.client, &meter.id, &self.granularity, start).await {
                    Ok(usage) => usage,
                    Err(e) => {
                        tracing::warn!(meter_id = %meter.id, error = %e, "usage request failed, skipping meter");
                        continue;
                    }
                };
                let latest = usage.results.last().and_then(|sample| sample.value);
                report.push(vec![
                    premise.name.clone(),
                    usage.meter_id.unwrap_or_else(|| meter.id.clone()),
                    text(usage.meter_type.as_deref().or(meter.meter_type.as_deref())),
                    number(latest),
                ]);
            }
        }
        Ok(report)
    }
}

/// Instant usage of every premise and today's usage series of every meter.
#[derive(Debug, Clone)]
pub struct AppDetailReport {
    pub granularity: String,
}

impl Default for AppDetailReport {
    fn default() -> Self {
        Self {
            granularity: "bihour".to_string(),
        }
    }
}

#[async_trait]
impl ReportBuilder for AppDetailReport {
    fn name(&self) -> &'static str {
        "app detail"
    }

    fn flow(&self) -> AuthFlow {
        AuthFlow::App
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        use ColumnType::{Number, Text};

        let state = AppState::fetch(ctx.client).await?;
        let start = start_of_today();
        let tz = ctx.client.timezone().unwrap_or(Tz::UTC);
        let series = format!("usage.{}", self.granularity);

        let mut report = Report::new(
            "Premise detail",
            &[
                ("Premise", Text),
                ("Meter", Text),
                ("Series", Text),
                ("Timestamp", Text),
                ("Value", Number),
            ],
        );
        for premise in &state.premise_list {
            ctx.progress.tick();
            match premise.instant(ctx.client).await {
                Ok(instant) => {
                    for (field, value) in &instant.fields {
                        report.push(vec![
                            premise.name.clone(),
                            String::new(),
                            format!("instant.{field}"),
                            String::new(),
                            scalar(value),
                        ]);
                    }
                }
                Err(e) => {
                    tracing::warn!(premise_id = %premise.id, error = %e, "instant usage request failed");
                }
            }

            for meter in &premise.meter_list {
                ctx.progress.tick();
                let usage = match UsageChunk::fetch_app(ctx.client, &meter.id, &self.granularity, start).await {
                    Ok(usage) => usage,
                    Err(e) => {
                        tracing::warn!(meter_id = %meter.id, error = %e, "usage request failed, skipping meter");
                        continue;
                    }
                };
                for sample in &usage.results {
                    report.push(vec![
                        premise.name.clone(),
                        meter.id.clone(),
                        series.clone(),
                        zoned_time(sample.time, tz),
                        number(sample.value),
                    ]);
                }
            }
        }
        Ok(report)
    }
}
