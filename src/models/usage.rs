//! Usage series and their incremental accumulation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CopperClient;
use crate::error::Result;

/// Query-string timestamp format used by the usage and readings endpoints.
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format a UTC instant for a query string.
pub fn query_time(t: DateTime<Utc>) -> String {
    t.format(QUERY_TIME_FORMAT).to_string()
}

/// One sample of a usage series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSample {
    #[serde(with = "crate::models::timestamp")]
    pub time: DateTime<Utc>,
    /// Energy in the interval ending at `time`.
    #[serde(default)]
    pub value: Option<f64>,
    /// Average power over the interval.
    #[serde(default)]
    pub power: Option<f64>,
}

/// One usage response, covering a single request window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageChunk {
    #[serde(default)]
    pub meter_id: Option<String>,
    #[serde(default)]
    pub meter_type: Option<String>,
    #[serde(default)]
    pub sum_usage: Option<f64>,
    #[serde(default)]
    pub results: Vec<UsageSample>,
}

impl UsageChunk {
    /// Usage of one meter over `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(client))]
    pub async fn fetch_meter(
        client: &CopperClient,
        meter_id: &str,
        granularity: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        let path = client.partner_path(&format!(
            "meter/{}/usage",
            urlencoding::encode(meter_id)
        ))?;
        let params = [
            ("granularity", granularity.to_string()),
            ("start", query_time(start)),
            ("end", query_time(end)),
        ];
        client.get(&path, &params).await
    }

    /// Usage summed over every meter of the enterprise.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(client))]
    pub async fn fetch_aggregate(
        client: &CopperClient,
        granularity: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        let path = client.partner_path("usage")?;
        let params = [
            ("granularity", granularity.to_string()),
            ("start", query_time(start)),
            ("end", query_time(end)),
        ];
        client.get(&path, &params).await
    }

    /// Usage of one meter from `start`, through the app API.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(client))]
    pub async fn fetch_app(
        client: &CopperClient,
        meter_id: &str,
        granularity: &str,
        start: DateTime<Utc>,
    ) -> Result<Self> {
        let path = format!("app/usage/{}", urlencoding::encode(meter_id));
        let params = [
            ("granularity", granularity.to_string()),
            ("start", query_time(start)),
        ];
        client.get(&path, &params).await
    }
}

/// A usage series stitched together from consecutive chunks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageAccumulator {
    pub meter_id: String,
    pub meter_type: Option<String>,
    pub sum_usage: f64,
    pub results: Vec<UsageSample>,
    /// IANA timezone the request windows were aligned to.
    pub tz: String,
    /// UTC offset of `tz` at the start of the range, in seconds east.
    pub tz_offset: i32,
    /// Windows that failed and left a gap in `results`.
    pub skipped_windows: usize,
}

impl UsageAccumulator {
    pub fn new(meter_id: &str, tz: &str, tz_offset: i32) -> Self {
        Self {
            meter_id: meter_id.to_string(),
            meter_type: None,
            sum_usage: 0.0,
            results: Vec::new(),
            tz: tz.to_string(),
            tz_offset,
            skipped_windows: 0,
        }
    }
}

/// Fold one chunk into the running series.
///
/// `sum_usage` adds up. Results are concatenated; when the last sample so far
/// has the same timestamp as the chunk's first sample, the earlier one is
/// dropped so a window boundary is counted once. The meter type is taken from
/// the first chunk that reports one.
pub fn merge(mut acc: UsageAccumulator, chunk: UsageChunk) -> UsageAccumulator {
    acc.sum_usage += chunk.sum_usage.unwrap_or(0.0);
    if acc.meter_type.is_none() {
        acc.meter_type = chunk.meter_type;
    }

    if let (Some(last), Some(first)) = (acc.results.last(), chunk.results.first()) {
        if last.time == first.time {
            acc.results.pop();
        }
    }
    acc.results.extend(chunk.results);
    acc
}
