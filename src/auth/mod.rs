//! OAuth token acquisition, caching and refresh.
//!
//! [`TokenManager`] owns the current [`TokenData`] and hides how it was
//! obtained: loaded from a [`TokenStore`], acquired through the
//! authorization-code grant (with [`Pkce`]), the client-credentials grant, or
//! refreshed with a stored refresh token.

mod manager;
mod pkce;
mod store;
mod token;

pub use manager::{AuthCodePrompt, Grant, NoPrompt, StdinPrompt, TokenManager, TokenState};
pub use pkce::{challenge_for, Pkce};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::TokenData;
