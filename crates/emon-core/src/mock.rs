//! Scriptable account backend for testing.
//!
//! [`MockAccountApi`] implements [`AccountApi`] from in-memory tables, so
//! session behaviour can be exercised without a server.
//!
//! # Features
//!
//! - **Accounts**: register username/password pairs and the token each one yields
//! - **Profiles**: script the profile (or a failure) returned for each token
//! - **Gates**: hold a token's profile fetch until the test releases it, to
//!   force out-of-order completion

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use emon_types::{UserProfile, UserSettings};

use crate::error::{Error, Result};
use crate::traits::AccountApi;

/// Failure a scripted call should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Answer as if the token or credentials were rejected.
    Unauthorized,
    /// Answer as if the server could not be reached.
    Unreachable,
    /// Answer with a validation error carrying this message.
    Rejected(&'static str),
}

impl MockFailure {
    fn to_error(self) -> Error {
        match self {
            MockFailure::Unauthorized => Error::Unauthorized,
            MockFailure::Unreachable => Error::network(
                "mock://account",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "mock unreachable"),
            ),
            MockFailure::Rejected(message) => Error::Validation {
                status: 400,
                message: Some(message.to_string()),
            },
        }
    }
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<(String, String), String>,
    profiles: HashMap<String, std::result::Result<UserProfile, MockFailure>>,
    gates: HashMap<String, Arc<Notify>>,
    settings_failure: Option<MockFailure>,
    settings_override: Option<UserSettings>,
}

/// In-memory [`AccountApi`].
///
/// # Example
///
/// ```ignore
/// use emon_core::{AccountApi, MockAccountApi};
///
/// #[tokio::main]
/// async fn main() {
///     let api = MockAccountApi::new();
///     api.add_account("alice", "pw", "tok-1");
///     assert_eq!(api.obtain_token("alice", "pw").await.unwrap(), "tok-1");
///     assert!(api.obtain_token("alice", "nope").await.is_err());
/// }
/// ```
#[derive(Default)]
pub struct MockAccountApi {
    tables: Mutex<Tables>,
    token_requests: AtomicU32,
    profile_fetches: AtomicU32,
    settings_saves: AtomicU32,
}

impl std::fmt::Debug for MockAccountApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAccountApi")
            .field("profile_fetches", &self.profile_fetches())
            .field("settings_saves", &self.settings_saves())
            .finish()
    }
}

impl MockAccountApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Accept `username`/`password` and hand out `token`.
    pub fn add_account(&self, username: &str, password: &str, token: &str) {
        self.tables().accounts.insert(
            (username.to_string(), password.to_string()),
            token.to_string(),
        );
    }

    /// Answer profile fetches for `token` with `profile`.
    pub fn set_profile(&self, token: &str, profile: UserProfile) {
        self.tables()
            .profiles
            .insert(token.to_string(), Ok(profile));
    }

    /// Make profile fetches for `token` fail.
    pub fn fail_profile(&self, token: &str, failure: MockFailure) {
        self.tables()
            .profiles
            .insert(token.to_string(), Err(failure));
    }

    /// Hold profile fetches for `token` until [`release_profile`](Self::release_profile).
    pub fn hold_profile(&self, token: &str) {
        self.tables()
            .gates
            .insert(token.to_string(), Arc::new(Notify::new()));
    }

    /// Let one held profile fetch for `token` complete.
    ///
    /// Releasing before the fetch starts is fine; the fetch then passes straight through.
    pub fn release_profile(&self, token: &str) {
        if let Some(gate) = self.tables().gates.get(token) {
            gate.notify_one();
        }
    }

    /// Make settings saves fail.
    pub fn fail_settings(&self, failure: Option<MockFailure>) {
        self.tables().settings_failure = failure;
    }

    /// Answer settings saves with `settings` instead of echoing the request.
    pub fn set_saved_settings(&self, settings: Option<UserSettings>) {
        self.tables().settings_override = settings;
    }

    pub fn token_requests(&self) -> u32 {
        self.token_requests.load(Ordering::Relaxed)
    }

    pub fn profile_fetches(&self) -> u32 {
        self.profile_fetches.load(Ordering::Relaxed)
    }

    pub fn settings_saves(&self) -> u32 {
        self.settings_saves.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AccountApi for MockAccountApi {
    async fn obtain_token(&self, username: &str, password: &str) -> Result<String> {
        self.token_requests.fetch_add(1, Ordering::Relaxed);
        self.tables()
            .accounts
            .get(&(username.to_string(), password.to_string()))
            .cloned()
            .ok_or(Error::Validation {
                status: 400,
                message: Some("Unable to log in with provided credentials.".to_string()),
            })
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile> {
        self.profile_fetches.fetch_add(1, Ordering::Relaxed);
        let gate = self.tables().gates.get(token).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.tables().profiles.get(token) {
            Some(Ok(profile)) => Ok(profile.clone()),
            Some(Err(failure)) => Err(failure.to_error()),
            None => Err(Error::Unauthorized),
        }
    }

    async fn save_settings(&self, token: &str, settings: &UserSettings) -> Result<UserSettings> {
        self.settings_saves.fetch_add(1, Ordering::Relaxed);
        settings.validate()?;
        let tables = self.tables();
        if !tables.profiles.contains_key(token) {
            return Err(Error::Unauthorized);
        }
        if let Some(failure) = tables.settings_failure {
            return Err(failure.to_error());
        }
        Ok(tables
            .settings_override
            .clone()
            .unwrap_or_else(|| settings.clone()))
    }
}
