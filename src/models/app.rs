//! Account state exposed to the consumer app.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::CopperClient;
use crate::error::Result;

/// The premises and meters visible to the logged-in user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub premise_list: Vec<AppPremise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppPremise {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub meter_list: Vec<AppMeter>,
}

/// A meter of an app premise; the type comes from `meter_type` or `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "AppMeterRecord")]
pub struct AppMeter {
    pub id: String,
    pub meter_type: Option<String>,
}

#[derive(Deserialize)]
struct AppMeterRecord {
    id: String,
    #[serde(default)]
    meter_type: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl From<AppMeterRecord> for AppMeter {
    fn from(record: AppMeterRecord) -> Self {
        Self {
            id: record.id,
            meter_type: record.meter_type.or(record.kind),
        }
    }
}

/// Instantaneous usage of a premise, kept as the API returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PremiseInstant {
    pub fields: Map<String, Value>,
}

impl AppPremise {
    /// Current usage of this premise.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(self, client), fields(premise_id = %self.id))]
    pub async fn instant(&self, client: &CopperClient) -> Result<PremiseInstant> {
        let path = format!("app/instant/premise/{}", urlencoding::encode(&self.id));
        client.get(&path, &[]).await
    }
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(client))]
    pub async fn fetch(client: &CopperClient) -> Result<Self> {
        client.get("app/state", &[]).await
    }
}
