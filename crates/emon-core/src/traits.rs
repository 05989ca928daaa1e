//! Trait abstractions for the account operations the session depends on.
//!
//! [`AccountApi`] is implemented by the real [`ApiGateway`] and by
//! `MockAccountApi` (behind the `mock` feature), so session behaviour can be
//! tested without a server.

use async_trait::async_trait;

use emon_types::{UserProfile, UserSettings};

use crate::error::Result;
use crate::gateway::ApiGateway;

/// The account endpoints the session manager needs.
///
/// Each call takes the token explicitly, so a request started for one token
/// can be recognised as stale once the session has moved on.
///
/// # Example
///
/// ```ignore
/// use emon_core::{AccountApi, Result};
///
/// async fn greet<A: AccountApi>(api: &A, token: &str) -> Result<()> {
///     let me = api.fetch_profile(token).await?;
///     println!("hello {}", me.username);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Exchange credentials for a token. Never signed.
    async fn obtain_token(&self, username: &str, password: &str) -> Result<String>;

    /// Profile of the user owning `token`.
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile>;

    /// Replace the settings resource; returns what the server stored.
    async fn save_settings(&self, token: &str, settings: &UserSettings) -> Result<UserSettings>;
}

#[async_trait]
impl AccountApi for ApiGateway {
    async fn obtain_token(&self, username: &str, password: &str) -> Result<String> {
        ApiGateway::obtain_token(self, username, password).await
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile> {
        self.with_token(token).current_user().await
    }

    async fn save_settings(&self, token: &str, settings: &UserSettings) -> Result<UserSettings> {
        self.with_token(token).save_settings(settings).await
    }
}
