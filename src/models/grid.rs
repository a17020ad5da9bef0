//! Grid telemetry reported by gateways.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::CopperClient;
use crate::error::Result;
use crate::models::usage::query_time;
use crate::pagination::ListBody;

/// Voltage and frequency seen by a gateway.
///
/// `gateway_id` falls back to `id` and `time` to `timestamp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "GridRecord")]
pub struct GridReading {
    pub gateway_id: Option<String>,

    #[serde(with = "crate::models::timestamp::option")]
    pub time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub voltage: Option<f64>,

    #[serde(default)]
    pub frequency: Option<f64>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct GridRecord {
    #[serde(default)]
    gateway_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "crate::models::timestamp::option::deserialize")]
    time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::models::timestamp::option::deserialize")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    voltage: Option<f64>,
    #[serde(default)]
    frequency: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<GridRecord> for GridReading {
    fn from(record: GridRecord) -> Self {
        Self {
            gateway_id: record.gateway_id.or(record.id),
            time: record.time.or(record.timestamp),
            voltage: record.voltage,
            frequency: record.frequency,
            extra: record.extra,
        }
    }
}

impl GridReading {
    /// Most recent reading of every gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(client))]
    pub async fn latest(client: &CopperClient) -> Result<Vec<Self>> {
        let path = client.partner_path("grid/latest")?;
        let body: ListBody<Self> = client.get(&path, &[]).await?;
        Ok(body.into_items())
    }

    /// Readings of every gateway over `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(client))]
    pub async fn readings(
        client: &CopperClient,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Self>> {
        let path = client.partner_path("grid/readings")?;
        let params = [("start", query_time(start)), ("end", query_time(end))];
        let body: ListBody<Self> = client.get(&path, &params).await?;
        Ok(body.into_items())
    }
}
