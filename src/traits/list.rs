//! List trait for offset/limit collections.

use async_trait::async_trait;

use crate::client::CopperClient;
use crate::error::Result;
use crate::pagination::{ErrorPolicy, Page, DEFAULT_PAGE_LIMIT, MAX_PAGES};

/// List entities with offset/limit pagination.
///
/// # Example
///
/// ```ignore
/// use coppercloud::{CopperClient, List, Premise};
///
/// // Fetch a single page
/// let page = Premise::list_page(&client, &Default::default(), 0, 50).await?;
///
/// // Fetch all pages
/// let premises = Premise::list_all(&client, &Default::default()).await?;
/// ```
#[async_trait]
pub trait List: Sized + Send {
    /// Query parameters for filtering.
    type Query: Default + Send + Sync;

    /// List entities matching the query (single page).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list_page(
        client: &CopperClient,
        query: &Self::Query,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Self>>;

    /// List all entities, failing fast on the first page error.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    async fn list_all(client: &CopperClient, query: &Self::Query) -> Result<Vec<Self>> {
        Self::list_all_with(client, query, DEFAULT_PAGE_LIMIT, ErrorPolicy::Abort).await
    }

    /// List all entities with an explicit page size and error policy.
    ///
    /// Offsets start at 0 and grow by `limit`; a page with fewer than `limit`
    /// items is the last one.
    ///
    /// # Errors
    ///
    /// Returns an error if a page request fails under [`ErrorPolicy::Abort`].
    async fn list_all_with(
        client: &CopperClient,
        query: &Self::Query,
        limit: u32,
        policy: ErrorPolicy,
    ) -> Result<Vec<Self>> {
        let limit = limit.max(1);
        let mut all_items = Vec::new();
        let mut offset = 0;
        let mut pages = 0;

        loop {
            let result = match Self::list_page(client, query, offset, limit).await {
                Ok(page) => page,
                Err(e) if policy == ErrorPolicy::Continue => {
                    tracing::warn!(offset, error = %e, "GET error, keeping {} items", all_items.len());
                    break;
                }
                Err(e) => return Err(e),
            };
            let has_more = result.has_more;
            offset = result.next_offset();
            all_items.extend(result.items);
            pages += 1;

            if !has_more {
                break;
            }

            // Safety limit to prevent infinite loops
            if pages >= MAX_PAGES {
                tracing::warn!("Reached pagination limit of {} pages, stopping", MAX_PAGES);
                break;
            }
        }

        Ok(all_items)
    }
}
