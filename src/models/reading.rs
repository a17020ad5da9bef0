//! Raw meter readings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::CopperClient;
use crate::error::Result;
use crate::models::usage::query_time;
use crate::pagination::ListBody;

/// A single meter reading (cumulative register value at `time`).
///
/// The instant is read from `time`, or from `timestamp` when `time` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ReadingRecord")]
pub struct Reading {
    #[serde(with = "crate::models::timestamp")]
    pub time: DateTime<Utc>,

    #[serde(default)]
    pub value: Option<f64>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct ReadingRecord {
    #[serde(default, deserialize_with = "crate::models::timestamp::option::deserialize")]
    time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::models::timestamp::option::deserialize")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    value: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<ReadingRecord> for Reading {
    type Error = String;

    fn try_from(record: ReadingRecord) -> std::result::Result<Self, Self::Error> {
        let time = record
            .time
            .or(record.timestamp)
            .ok_or_else(|| "reading has neither `time` nor `timestamp`".to_string())?;
        Ok(Self {
            time,
            value: record.value,
            extra: record.extra,
        })
    }
}

impl Reading {
    /// Readings of one meter over `[start, end)`, in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(client))]
    pub async fn fetch(
        client: &CopperClient,
        meter_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Self>> {
        let path = client.partner_path(&format!(
            "meter/{}/readings",
            urlencoding::encode(meter_id)
        ))?;
        let params = [("start", query_time(start)), ("end", query_time(end))];
        let body: ListBody<Self> = client.get(&path, &params).await?;
        Ok(body.into_items())
    }
}
