//! # mindmap-client
//!
//! The application core behind the mind-map UI: passphrase login with a
//! time-boxed local cache, the project list, and the load/edit/save cycle of
//! the open document. UI surfaces drive a [`Workspace`] and listen to its
//! [`AppEvent`]s.

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod slot;
pub mod state;
pub mod workspace;

use tracing_subscriber::{fmt, EnvFilter};

pub use auth::{AuthError, AuthState};
pub use config::{Backend, ClientConfig};
pub use error::{ClientError, Result};
pub use events::AppEvent;
pub use session::Session;
pub use state::SaveStatus;
pub use workspace::Workspace;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("mindmap_client=debug,mindmap_store=info,mindmap_shared=info,warn")
    });

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    if installed.is_ok() {
        tracing::info!("Starting mindmap client");
    }
}
