//! Pagination utilities for Copper Cloud collections.
//!
//! Two idioms exist: cursor-linked pages carrying a relative `next` URL
//! ([`walk_cursor`]), and offset/limit pages ([`crate::List::list_all`]).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::client::CopperClient;
use crate::error::Result;

/// Default page size for collection requests.
pub const DEFAULT_PAGE_LIMIT: u32 = 1000;

/// Maximum pages to fetch (safety limit).
pub const MAX_PAGES: u32 = 10_000;

/// What a multi-request loop does when one request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log the failure and keep what was gathered.
    Continue,
    /// Stop and propagate the error.
    Abort,
}

/// A page of results from an offset/limit endpoint.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Offset of the first item.
    pub offset: u32,
    /// Requested page size.
    pub limit: u32,
    /// Whether another page may follow. Only a short page ends the listing.
    pub has_more: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, offset: u32, limit: u32) -> Self {
        let has_more = items.len() >= limit as usize;
        Self {
            items,
            offset,
            limit,
            has_more,
        }
    }

    /// Offset of the page that follows this one.
    #[must_use]
    pub fn next_offset(&self) -> u32 {
        self.offset.saturating_add(self.limit)
    }
}

/// Collection bodies come either bare or wrapped in `results`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { results: Vec<T> },
}

impl<T> ListBody<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { results: items } => items,
        }
    }
}

/// One page of a cursor-linked collection.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct CursorPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> CursorPage<T> {
    /// The `next` link, treating an empty string as absent.
    pub fn next_link(&self) -> Option<&str> {
        self.next.as_deref().filter(|n| !n.is_empty())
    }
}

/// Follow `next` links from `first` until the server stops sending one.
///
/// With [`ErrorPolicy::Continue`] a failed page ends the walk and the items
/// gathered so far are returned; with [`ErrorPolicy::Abort`] the error
/// propagates.
///
/// # Errors
///
/// Returns an error only under [`ErrorPolicy::Abort`].
#[tracing::instrument(skip(client, first), fields(first = %first))]
pub async fn walk_cursor<T: DeserializeOwned>(
    client: &CopperClient,
    first: Url,
    policy: ErrorPolicy,
) -> Result<Vec<T>> {
    let mut all_items = Vec::new();
    let mut url = first;
    let mut pages = 0;

    loop {
        let page: CursorPage<T> = match fetch_page(client, url.clone()).await {
            Ok(page) => page,
            Err(e) if policy == ErrorPolicy::Continue => {
                tracing::warn!(url = %url, error = %e, "GET error, keeping {} items", all_items.len());
                break;
            }
            Err(e) => return Err(e),
        };
        pages += 1;

        let next = page.next_link().map(str::to_string);
        all_items.extend(page.results);

        let Some(next) = next else { break };
        url = client.resolve_next(&next)?;

        // Safety limit to prevent infinite loops
        if pages >= MAX_PAGES {
            tracing::warn!("Reached pagination limit of {} pages, stopping", MAX_PAGES);
            break;
        }
    }

    Ok(all_items)
}

async fn fetch_page<T: DeserializeOwned>(client: &CopperClient, url: Url) -> Result<CursorPage<T>> {
    let value = client.get_url(url).await?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_more_only_when_full() {
        let page: Page<i32> = Page::new(vec![1; 100], 0, 100);
        assert!(page.has_more);
        assert_eq!(page.next_offset(), 100);

        let page: Page<i32> = Page::new(vec![1; 50], 100, 100);
        assert!(!page.has_more);

        let page: Page<i32> = Page::new(vec![], 0, 100);
        assert!(!page.has_more);
    }

    #[test]
    fn test_list_body_shapes() {
        let bare: ListBody<u32> = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(bare.into_items(), vec![1, 2]);

        let wrapped: ListBody<u32> = serde_json::from_str(r#"{"results":[3]}"#).unwrap();
        assert_eq!(wrapped.into_items(), vec![3]);
    }

    #[test]
    fn test_cursor_next_link_falsy_values() {
        let page: CursorPage<u32> = serde_json::from_str(r#"{"results":[1],"next":null}"#).unwrap();
        assert!(page.next_link().is_none());

        let page: CursorPage<u32> = serde_json::from_str(r#"{"results":[1],"next":""}"#).unwrap();
        assert!(page.next_link().is_none());

        let page: CursorPage<u32> = serde_json::from_str(r#"{"results":[]}"#).unwrap();
        assert!(page.next_link().is_none());

        let page: CursorPage<u32> = serde_json::from_str(r#"{"next":"/p2"}"#).unwrap();
        assert_eq!(page.next_link(), Some("/p2"));
        assert!(page.results.is_empty());
    }
}
