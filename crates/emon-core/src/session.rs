//! Session lifecycle: token, current user, and derived authorization flags.
//!
//! [`SessionManager`] is the only place session state changes. It persists
//! the token through a [`TokenStore`], resolves the user profile in the
//! background whenever the token changes, and clears itself when that
//! resolution fails.
//!
//! Every token change starts a new generation. A profile fetch only commits
//! its result (or its logout) if its generation is still current, so a slow
//! answer for an old token can never overwrite the state of a newer one.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use emon_core::{ApiGateway, FileTokenStore, SessionManager};
//!
//! let gateway = ApiGateway::new(api_url, auth_url)?;
//! let session = SessionManager::new(Arc::new(gateway), Arc::new(FileTokenStore::open_default()?));
//! session.initialize();
//! let state = session.wait_settled().await;
//! println!("authenticated: {}", state.is_authenticated());
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use emon_types::{UserProfile, UserSettings};

use crate::error::{Error, Result};
use crate::token_store::TokenStore;
use crate::traits::AccountApi;

/// Message shown when the token endpoint rejects a login.
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Point-in-time view of the session.
///
/// `user` and `settings` are only ever present together with `token`.
/// `auth_loading` is only true while a token restored at start-up is being
/// resolved into a profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub settings: Option<UserSettings>,
    pub auth_loading: bool,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Staff users only; false until the profile has loaded.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_staff)
    }

    fn apply_settings(&mut self, settings: UserSettings) {
        if let Some(user) = self.user.as_mut() {
            user.settings = Some(settings.clone());
        }
        self.settings = Some(settings);
    }
}

struct State {
    session: Session,
    generation: u64,
    fetch_pending: bool,
    fetch_task: Option<AbortHandle>,
}

impl State {
    /// Start a new generation, dropping any fetch tied to the old one.
    fn advance(&mut self) -> u64 {
        self.generation += 1;
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        self.fetch_pending = false;
        self.generation
    }
}

struct Shared {
    api: Arc<dyn AccountApi>,
    store: Arc<dyn TokenStore>,
    state: Mutex<State>,
    changes: watch::Sender<u64>,
}

/// Owner of the session state.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionManager")
            .field("authenticated", &state.session.is_authenticated())
            .field("auth_loading", &state.session.auth_loading)
            .field("generation", &state.generation)
            .finish()
    }
}

impl SessionManager {
    /// Create an empty session. Nothing is read until [`initialize`](Self::initialize).
    pub fn new(api: Arc<dyn AccountApi>, store: Arc<dyn TokenStore>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                api,
                store,
                state: Mutex::new(State {
                    session: Session::default(),
                    generation: 0,
                    fetch_pending: false,
                    fetch_task: None,
                }),
                changes,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self) {
        self.shared.changes.send_modify(|version| *version = version.wrapping_add(1));
    }

    // ======================================================================
    // Lifecycle
    // ======================================================================

    /// Restore the persisted token, if any, and start resolving its profile.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn initialize(&self) {
        let token = match self.shared.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "could not read stored token");
                None
            }
        };

        let mut state = self.lock();
        state.advance();
        match token {
            None => {
                debug!("no stored token");
                state.session = Session::default();
            }
            Some(token) => {
                debug!("restoring session from stored token");
                state.session = Session {
                    token: Some(token.clone()),
                    user: None,
                    settings: None,
                    auth_loading: true,
                };
                self.spawn_fetch(&mut state, token);
            }
        }
        drop(state);
        self.publish();
    }

    /// Authenticate with the token endpoint.
    ///
    /// On success the token is persisted and becomes current, and the
    /// profile is fetched in the background; this returns without waiting
    /// for it. On failure the session is left exactly as it was.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let token = match self.shared.api.obtain_token(username, password).await {
            Ok(token) => token,
            Err(e) => {
                warn!(username, error = %e, "login rejected");
                return false;
            }
        };

        let mut state = self.lock();
        state.advance();
        if let Err(e) = self.shared.store.save(&token) {
            warn!(error = %e, "could not persist token");
        }
        state.session = Session {
            token: Some(token.clone()),
            ..Session::default()
        };
        self.spawn_fetch(&mut state, token);
        drop(state);

        info!(username, "logged in");
        self.publish();
        true
    }

    /// Fetch the profile for the current token.
    ///
    /// Any failure logs the session out and yields `None`. A result that
    /// arrives after the token has changed is discarded and also yields `None`.
    pub async fn fetch_profile(&self) -> Option<UserProfile> {
        let (generation, token) = {
            let state = self.lock();
            (state.generation, state.session.token.clone())
        };
        self.fetch_for(generation, token?).await
    }

    /// Forget the token, the user and the settings. Safe to call repeatedly.
    pub fn logout(&self) {
        let mut state = self.lock();
        let was_authenticated = state.session.is_authenticated();
        self.clear_locked(&mut state);
        drop(state);

        if was_authenticated {
            info!("logged out");
        }
        self.publish();
    }

    // ======================================================================
    // Settings
    // ======================================================================

    /// Replace the settings in memory, both top-level and inside the user.
    ///
    /// Ignored while logged out.
    pub fn update_settings_locally(&self, settings: UserSettings) {
        self.update_settings_for(None, settings);
    }

    /// Apply settings if the session is still the one of `generation`.
    ///
    /// Returns whether they were applied.
    fn update_settings_for(&self, generation: Option<u64>, settings: UserSettings) -> bool {
        let mut state = self.lock();
        if !state.session.is_authenticated() {
            debug!("ignoring settings update without a session");
            return false;
        }
        if generation.is_some_and(|generation| generation != state.generation) {
            debug!("settings belong to a replaced session; not applied");
            return false;
        }
        state.session.apply_settings(settings);
        drop(state);
        self.publish();
        true
    }

    /// Save settings on the server and adopt the server's copy.
    pub async fn save_settings(&self, settings: &UserSettings) -> Result<UserSettings> {
        let (generation, token) = {
            let state = self.lock();
            (state.generation, state.session.token.clone())
        };
        let token = token.ok_or(Error::Unauthorized)?;

        let saved = self.shared.api.save_settings(&token, settings).await?;

        if self.update_settings_for(Some(generation), saved.clone()) {
            debug!(interval = saved.live_refresh_interval_secs, "settings saved");
        }
        Ok(saved)
    }

    // ======================================================================
    // Queries
    // ======================================================================

    /// Copy of the current state.
    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().session.token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.lock().session.is_admin()
    }

    /// Wait until no background profile fetch is outstanding, then return the state.
    pub async fn wait_settled(&self) -> Session {
        let mut changes = self.shared.changes.subscribe();
        loop {
            {
                let state = self.lock();
                if !state.fetch_pending {
                    return state.session.clone();
                }
            }
            if changes.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    // ======================================================================
    // Internals
    // ======================================================================

    fn spawn_fetch(&self, state: &mut State, token: String) {
        let generation = state.generation;
        let this = self.clone();
        let task = tokio::spawn(async move {
            this.fetch_for(generation, token).await;
        });
        state.fetch_pending = true;
        state.fetch_task = Some(task.abort_handle());
    }

    async fn fetch_for(&self, generation: u64, token: String) -> Option<UserProfile> {
        let result = self.shared.api.fetch_profile(&token).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!("discarding profile fetched for a replaced token");
            return None;
        }

        match result {
            Ok(profile) => {
                state.session.user = Some(profile.clone());
                state.session.settings = profile.settings.clone();
                state.session.auth_loading = false;
                state.fetch_pending = false;
                state.fetch_task = None;
                drop(state);

                info!(username = %profile.username, staff = profile.is_staff, "profile loaded");
                self.publish();
                Some(profile)
            }
            Err(e) => {
                warn!(error = %e, "profile fetch failed; logging out");
                self.clear_locked(&mut state);
                drop(state);
                self.publish();
                None
            }
        }
    }

    fn clear_locked(&self, state: &mut State) {
        if let Err(e) = self.shared.store.clear() {
            warn!(error = %e, "could not remove stored token");
        }
        state.advance();
        state.session = Session::default();
    }
}
