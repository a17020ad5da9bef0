//! Meter models: listing, bulk snapshot and location.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::CopperClient;
use crate::error::Result;
use crate::models::{partner_page, EntityListQuery};
use crate::pagination::{walk_cursor, ErrorPolicy, Page};
use crate::traits::{Get, List};

/// A meter as returned by the meter listing.
///
/// The id may arrive as `id` or `meter_id` and the type as `meter_type` or
/// `type`; when both spellings are present the first one listed wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MeterRecord")]
pub struct Meter {
    /// Meter id, e.g. `elec:0123456789`.
    pub id: String,

    /// Meter type such as `power_net`, `gas`, `water_indoor`.
    pub meter_type: Option<String>,

    #[serde(default)]
    pub premise_id: Option<String>,

    /// When the meter started reporting; earlier data does not exist.
    #[serde(with = "crate::models::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct MeterRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    meter_id: Option<String>,
    #[serde(default)]
    meter_type: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    premise_id: Option<String>,
    #[serde(default, deserialize_with = "crate::models::timestamp::option::deserialize")]
    created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<MeterRecord> for Meter {
    type Error = String;

    fn try_from(record: MeterRecord) -> std::result::Result<Self, Self::Error> {
        let id = record
            .id
            .or(record.meter_id)
            .ok_or_else(|| "meter has neither `id` nor `meter_id`".to_string())?;
        Ok(Self {
            id,
            meter_type: record.meter_type.or(record.kind),
            premise_id: record.premise_id,
            created_at: record.created_at,
            extra: record.extra,
        })
    }
}

impl Meter {
    /// File-system friendly form of the id (`:` is replaced by `_`).
    pub fn file_stem(&self) -> String {
        file_stem(&self.id)
    }
}

/// File-system friendly form of a meter id.
pub fn file_stem(meter_id: &str) -> String {
    meter_id.replace(':', "_")
}

#[async_trait]
impl List for Meter {
    type Query = EntityListQuery;

    #[tracing::instrument(skip(client))]
    async fn list_page(
        client: &CopperClient,
        query: &Self::Query,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Self>> {
        partner_page(client, "meter", query, offset, limit).await
    }
}

/// Latest value of a meter, from the bulk snapshot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkMeter {
    pub meter_id: String,

    #[serde(default)]
    pub meter_type: Option<String>,

    #[serde(default, with = "crate::models::timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub value: Option<f64>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BulkMeter {
    /// Walk the cursor-linked bulk snapshot of every meter.
    ///
    /// # Errors
    ///
    /// Returns an error if the enterprise id is missing, or if a page fails
    /// under [`ErrorPolicy::Abort`].
    #[tracing::instrument(skip(client))]
    pub async fn snapshot(
        client: &CopperClient,
        limit: u32,
        policy: ErrorPolicy,
    ) -> Result<Vec<Self>> {
        let path = client.partner_path("bulk")?;
        let first = client.url(&path, &[("limit", limit.to_string())])?;
        walk_cursor(client, first, policy).await
    }
}

/// Service address and timezone of a meter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "LocationRecord")]
pub struct MeterLocation {
    #[serde(default)]
    pub street_address: Option<String>,

    #[serde(default)]
    pub city_town: Option<String>,

    #[serde(default)]
    pub postal_code: Option<String>,

    /// IANA timezone name of the premise, from `timezone` or else `tz`.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct LocationRecord {
    #[serde(default)]
    street_address: Option<String>,
    #[serde(default)]
    city_town: Option<String>,
    #[serde(default)]
    postal_code: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    tz: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<LocationRecord> for MeterLocation {
    fn from(record: LocationRecord) -> Self {
        Self {
            street_address: record.street_address,
            city_town: record.city_town,
            postal_code: record.postal_code,
            timezone: record.timezone.or(record.tz),
            extra: record.extra,
        }
    }
}

impl MeterLocation {
    /// Postal code left-padded with zeros to five digits.
    pub fn padded_postal_code(&self) -> String {
        self.postal_code
            .as_deref()
            .map(|code| format!("{code:0>5}"))
            .unwrap_or_default()
    }
}

#[async_trait]
impl Get for MeterLocation {
    type Id = String; // Meter id

    #[tracing::instrument(skip(client))]
    async fn get(client: &CopperClient, meter_id: String) -> Result<Self> {
        let path = format!("partner/meter/{}/location", urlencoding::encode(&meter_id));
        client.get(&path, &[]).await
    }
}
