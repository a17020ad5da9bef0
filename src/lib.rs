//! Copper Cloud API client library.
//!
//! A Rust library and CLI for the Copper Labs metering API. Entity types
//! implement the operation traits ([`Get`], [`List`]) their endpoints support;
//! time series are fetched through the date-range chunker in [`chunking`].
//!
//! # Quick Start
//!
//! ```no_run
//! use coppercloud::{AuthFlow, Config, CopperClient, List, Meter};
//! use coppercloud::chunking::{fetch_usage_chunked, DateRange, UsageOptions};
//! use coppercloud::progress::Silent;
//!
//! #[tokio::main]
//! async fn main() -> coppercloud::Result<()> {
//!     // Client-credentials login, token cached in .copper_cloud_cache
//!     let config = Config::from_env(AuthFlow::Enterprise)?;
//!     let client = CopperClient::connect(&config).await?;
//!
//!     let meters = Meter::list_all(&client, &Default::default()).await?;
//!     println!("Found {} meters", meters.len());
//!
//!     // Three days of hourly usage, one request per day
//!     let range = DateRange::new(
//!         "2024-01-01".parse().unwrap(),
//!         "2024-01-04".parse().unwrap(),
//!     );
//!     let usage =
//!         fetch_usage_chunked(&client, &meters[0], range, &UsageOptions::default(), &Silent).await?;
//!     println!("{} used {:.3}", usage.meter_id, usage.sum_usage);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Authentication
//!
//! Two OAuth flows are supported, selected by [`AuthFlow`]:
//!
//! - [`AuthFlow::Enterprise`] - client-credentials grant for the partner
//!   endpoints
//! - [`AuthFlow::App`] - authorization-code grant with PKCE for the consumer
//!   app endpoints; the user pastes the code back on standard input
//!
//! Tokens are cached through a [`TokenStore`]. An unauthorized response
//! triggers a single re-authentication per client; a second one is fatal.
//!
//! # Configuration
//!
//! [`Config::from_env`] reads:
//!
//! - `COPPER_CLIENT_ID`, `COPPER_CLIENT_SECRET`, `COPPER_ENTERPRISE_ID`
//!   (required for the enterprise flow)
//! - `COPPER_APP_CLIENT_ID` (optional, app flow)
//! - `COPPER_AUTH_URL`, `COPPER_API_URL` (optional endpoint overrides)
//! - `COPPER_CACHE_FILE` (optional token cache location)
//! - `COPPER_TIMEZONE` (optional timezone for date chunking)

pub mod auth;
pub mod chunking;
pub mod cli;
mod client;
mod config;
mod error;
mod http;
mod models;
pub mod output;
mod pagination;
pub mod progress;
pub mod reports;
mod traits;

// Re-export core types
pub use auth::{TokenData, TokenManager, TokenState, TokenStore};
pub use client::CopperClient;
pub use config::{parse_timezone, AuthFlow, Config, DEFAULT_APP_CLIENT_ID};
pub use error::{CopperError, FailedResponse, Result};
pub use http::HttpHelper;
pub use pagination::{walk_cursor, CursorPage, ErrorPolicy, Page, DEFAULT_PAGE_LIMIT, MAX_PAGES};

// Re-export traits
pub use traits::{Get, List};

// Re-export models
pub use models::{
    // Listings
    EntityListQuery,
    Gateway,
    Meter,
    Premise,
    // Meter data
    BulkMeter,
    MeterLocation,
    Reading,
    // Usage
    merge,
    UsageAccumulator,
    UsageChunk,
    UsageSample,
    // Grid
    GridReading,
    // App
    AppMeter,
    AppPremise,
    AppState,
    PremiseInstant,
};
