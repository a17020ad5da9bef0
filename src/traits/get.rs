//! Get trait for fetching single entities.

use async_trait::async_trait;

use crate::client::CopperClient;
use crate::error::Result;

/// Fetch a single entity by ID.
///
/// # Example
///
/// ```ignore
/// use coppercloud::{CopperClient, Get, MeterLocation};
///
/// let location = MeterLocation::get(&client, "elec:01234".to_string()).await?;
/// ```
#[async_trait]
pub trait Get: Sized {
    /// The ID type for this entity.
    type Id;

    /// Fetch the entity by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn get(client: &CopperClient, id: Self::Id) -> Result<Self>;
}
