//! Per-invocation state shared by the commands.
//!
//! Every guarded command goes through [`App::enter`]: the stored session is
//! restored and settled, then the route guard decides what actually renders.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use serde::Serialize;
use tracing::debug;

use emon_core::guard::{self, Shell, View};
use emon_core::{ApiGateway, FileTokenStore, Session, SessionManager, TokenStore};

use crate::cli::{GlobalArgs, OutputFormat};
use crate::config::{Config, resolve_endpoints, resolve_format, resolve_style};
use crate::format::FormatOptions;
use crate::util::{spinner, write_output};

/// What the guard let through for a command.
#[derive(Debug)]
pub struct Entry {
    pub session: Session,
    /// The view that renders; differs from the requested one after a redirect.
    pub view: View,
    pub shell: Shell,
    /// Gateway signed with the session token, if there is one.
    pub api: ApiGateway,
}

pub struct App {
    gateway: ApiGateway,
    session: SessionManager,
    pub opts: FormatOptions,
    pub format: OutputFormat,
    pub quiet: bool,
    pub output: Option<PathBuf>,
}

impl App {
    pub fn new(global: &GlobalArgs, config: &Config) -> Result<Self> {
        let store = FileTokenStore::open_default().context("Failed to locate the token file")?;
        Self::with_store(global, config, Arc::new(store))
    }

    pub fn with_store(
        global: &GlobalArgs,
        config: &Config,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let endpoints = resolve_endpoints(global, config);
        let gateway =
            ApiGateway::with_timeout(&endpoints.api_url, &endpoints.auth_url, endpoints.timeout)
                .context("Invalid server configuration")?;
        debug!(api = %gateway.api_url(), auth = %gateway.auth_url(), "using server");

        let session = SessionManager::new(Arc::new(gateway.clone()), store);
        let opts = FormatOptions::new(global.no_color || config.no_color, resolve_style(global.style))
            .with_compact(global.compact);

        Ok(Self {
            gateway,
            session,
            opts,
            format: resolve_format(global.json, config),
            quiet: global.quiet,
            output: global.output.clone(),
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Restore the stored token and wait for its profile to resolve.
    pub async fn restore(&self) -> Session {
        self.session.initialize();
        let pb = self.spinner("Restoring session...");
        let session = self.session.wait_settled().await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        session
    }

    /// Gateway signed with the session's token.
    pub fn signed(&self, session: &Session) -> ApiGateway {
        match &session.token {
            Some(token) => self.gateway.with_token(token.clone()),
            None => self.gateway.unsigned(),
        }
    }

    /// Navigate to `view` through the guard.
    ///
    /// A redirect to the login view is an error telling the user to sign in.
    pub async fn enter(&self, view: View) -> Result<Entry> {
        let session = self.restore().await;
        let (landed, shell, hops) = guard::land(&session, &view.path());
        if landed == View::Login && view != View::Login {
            bail!("Not signed in. Run 'emon login' first.");
        }
        if !hops.is_empty() {
            debug!(requested = %view, landed = %landed, "redirected");
        }
        Ok(Entry {
            api: self.signed(&session),
            session,
            view: landed,
            shell,
        })
    }

    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if self.is_json() || !self.opts.is_rich() {
            return None;
        }
        spinner(message, self.quiet)
    }

    pub fn emit(&self, content: &str) -> Result<()> {
        write_output(self.output.as_ref(), content)
    }

    pub fn emit_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let json = self.opts.as_json(value)?;
        self.emit(&json)
    }

    /// Status line on stderr, unless quiet.
    pub fn note(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }
}
