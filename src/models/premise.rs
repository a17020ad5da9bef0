//! Premise model and trait implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::CopperClient;
use crate::error::Result;
use crate::models::{partner_page, EntityListQuery};
use crate::pagination::Page;
use crate::traits::List;

/// A metered premise (home or building).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Premise {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub street_address: Option<String>,

    #[serde(default)]
    pub city_town: Option<String>,

    #[serde(default)]
    pub postal_code: Option<String>,

    #[serde(default, with = "crate::models::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,

    /// Fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[async_trait]
impl List for Premise {
    type Query = EntityListQuery;

    #[tracing::instrument(skip(client))]
    async fn list_page(
        client: &CopperClient,
        query: &Self::Query,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Self>> {
        partner_page(client, "premise", query, offset, limit).await
    }
}
