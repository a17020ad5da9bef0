//! Copper Cloud model types.
//!
//! Entities are kept close to the wire: the fields reports use are typed, the
//! rest is preserved in a flattened `extra` map.

mod app;
mod gateway;
mod grid;
mod meter;
mod premise;
mod reading;
mod usage;

pub use app::*;
pub use gateway::*;
pub use grid::*;
pub use meter::*;
pub use premise::*;
pub use reading::*;
pub use usage::*;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::CopperClient;
use crate::error::Result;
use crate::pagination::{ListBody, Page};

/// Query parameters shared by the premise, meter and gateway listings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityListQuery {
    /// Only entities in this postal code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Fetch one offset/limit page of `partner/{eid}/{resource}`.
pub(crate) async fn partner_page<T: DeserializeOwned + Send>(
    client: &CopperClient,
    resource: &str,
    query: &EntityListQuery,
    offset: u32,
    limit: u32,
) -> Result<Page<T>> {
    let path = client.partner_path(resource)?;
    let mut params = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
    if let Some(postal_code) = &query.postal_code {
        params.push(("postal_code", postal_code.clone()));
    }

    let body: ListBody<T> = client.get(&path, &params).await?;
    Ok(Page::new(body.into_items(), offset, limit))
}

/// Lenient timestamp (de)serialization.
///
/// Accepts RFC 3339 and naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC);
/// always writes RFC 3339.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'"))),
            }
        }

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => s.serialize_str(&v.to_rfc3339()),
                None => s.serialize_none(),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_variants() {
            let expected = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
            assert_eq!(parse("2024-03-01T07:00:00Z"), Some(expected));
            assert_eq!(parse("2024-03-01T00:00:00-07:00"), Some(expected));
            assert_eq!(parse("2024-03-01T07:00:00"), Some(expected));
            assert_eq!(parse("2024-03-01 07:00:00"), Some(expected));
            assert_eq!(parse("2024-03-01T07:00:00.000"), Some(expected));
            assert_eq!(parse("yesterday"), None);
        }
    }
}
