//! Client core for the home energy monitoring API.
//!
//! This crate holds everything between the wire types in `emon-types` and a
//! user interface:
//!
//! - **API gateway**: signed `reqwest` calls for every resource, with server
//!   errors mapped onto [`Error`]
//! - **Session manager**: token persistence, background profile resolution,
//!   auto-logout when the profile cannot be fetched
//! - **Route guard**: a pure decision from session flags to render/redirect
//! - **Live poller**: interval-driven refresh with a replaceable callback
//! - **View loaders**: joined fetches, the alert board, the sensor monitor
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use emon_core::guard::{Navigation, navigate};
//! use emon_core::{ApiGateway, FileTokenStore, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = ApiGateway::new(
//!         emon_core::DEFAULT_API_URL,
//!         emon_core::DEFAULT_AUTH_URL,
//!     )?;
//!     let session = SessionManager::new(
//!         Arc::new(gateway.clone()),
//!         Arc::new(FileTokenStore::open_default()?),
//!     );
//!
//!     session.initialize();
//!     let state = session.wait_settled().await;
//!     match navigate(&state, "/dashboard") {
//!         Navigation::Render { .. } => {
//!             let signed = gateway.with_token(state.token.unwrap_or_default());
//!             println!("{} houses", signed.houses().await?.len());
//!         }
//!         Navigation::Redirect(view) => println!("go to {view}"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod guard;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod poller;
pub mod session;
pub mod token_store;
pub mod traits;
pub mod views;

pub use error::{Error, GENERIC_FORM_ERROR, Result};
pub use gateway::{ApiGateway, DEFAULT_API_URL, DEFAULT_AUTH_URL, DEFAULT_TIMEOUT};
pub use guard::{Access, Area, Navigation, Shell, View};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockAccountApi, MockFailure};
pub use poller::{DEFAULT_POLL_INTERVAL, LivePoller, PollerState, interval_for};
pub use session::{INVALID_CREDENTIALS, Session, SessionManager};
pub use token_store::{FileTokenStore, MemoryTokenStore, TOKEN_FILE_ENV, TokenStore};
pub use traits::AccountApi;
pub use views::{AlertBoard, SensorMonitor, ViewState};

// Re-export the wire types so downstream crates need only one dependency.
pub use emon_types as types;
