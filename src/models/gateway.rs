//! Gateway model and trait implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::CopperClient;
use crate::error::Result;
use crate::models::{partner_page, EntityListQuery};
use crate::pagination::Page;
use crate::traits::List;

/// A gateway relaying meter data for a premise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GatewayRecord")]
pub struct Gateway {
    /// From `id`, else `gateway_id`.
    pub id: String,

    pub premise_id: Option<String>,

    /// From `state`, else `status`.
    pub state: Option<String>,

    pub firmware_version: Option<String>,

    #[serde(with = "crate::models::timestamp::option")]
    pub last_heard: Option<DateTime<Utc>>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct GatewayRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    gateway_id: Option<String>,
    #[serde(default)]
    premise_id: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    firmware_version: Option<String>,
    #[serde(default, deserialize_with = "crate::models::timestamp::option::deserialize")]
    last_heard: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<GatewayRecord> for Gateway {
    type Error = String;

    fn try_from(record: GatewayRecord) -> std::result::Result<Self, Self::Error> {
        let id = record
            .id
            .or(record.gateway_id)
            .ok_or_else(|| "gateway has neither `id` nor `gateway_id`".to_string())?;
        Ok(Self {
            id,
            premise_id: record.premise_id,
            state: record.state.or(record.status),
            firmware_version: record.firmware_version,
            last_heard: record.last_heard,
            extra: record.extra,
        })
    }
}

#[async_trait]
impl List for Gateway {
    type Query = EntityListQuery;

    #[tracing::instrument(skip(client))]
    async fn list_page(
        client: &CopperClient,
        query: &Self::Query,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Self>> {
        partner_page(client, "gateway", query, offset, limit).await
    }
}
