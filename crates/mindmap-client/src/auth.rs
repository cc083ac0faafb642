//! Passphrase validation.
//!
//! There is no stored key-check value: a passphrase is accepted when the
//! `default` project's document opens with it. The [`Authenticator`] runs
//! that probe and, on success, writes the session cache.

use std::sync::Arc;

use chrono::{Duration, Utc};
use mindmap_shared::constants::DEFAULT_PROJECT_ID;
use mindmap_store::{ProjectStore, StoreError};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::session::Session;
use crate::slot::SessionSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthState {
    LoggedOut,
    Validating,
    LoggedIn,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("passphrase must not be empty")]
    EmptyPassphrase,

    #[error("wrong passphrase")]
    WrongPassphrase,

    #[error("could not verify the passphrase: {0}")]
    Unavailable(String),

    #[error("a passphrase check is already running")]
    InProgress,
}

pub struct Authenticator {
    store: ProjectStore,
    slot: Arc<dyn SessionSlot>,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(store: ProjectStore, slot: Arc<dyn SessionSlot>, ttl: Duration) -> Self {
        Self { store, slot, ttl }
    }

    /// Cached session from a previous run, if it has not expired.
    pub fn cached_session(&self) -> Option<Session> {
        Session::restore(self.slot.as_ref(), Utc::now(), self.ttl)
    }

    /// Drop the cached session so the next start asks again.
    pub fn forget_cached(&self) {
        Session::forget(self.slot.as_ref());
    }

    /// Probe the `default` record with `candidate`.
    ///
    /// On success the new session is cached in the slot and returned.
    pub async fn validate(&self, candidate: &str) -> Result<Session, AuthError> {
        if candidate.is_empty() {
            return Err(AuthError::EmptyPassphrase);
        }

        match self.store.load_existing_document(DEFAULT_PROJECT_ID, candidate).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!("default record is missing, cannot validate passphrase");
                return Err(AuthError::Unavailable("default project is missing".into()));
            }
            Err(StoreError::DecryptionFailed) => {
                warn!("passphrase rejected");
                return Err(AuthError::WrongPassphrase);
            }
            Err(e) => {
                warn!(error = %e, "default record unusable, cannot validate passphrase");
                return Err(AuthError::Unavailable(e.to_string()));
            }
        }

        let session = Session::new(candidate, Utc::now()).with_ttl(self.ttl);
        if let Err(e) = session.persist(self.slot.as_ref()) {
            warn!(error = %e, "failed to cache session");
        }
        info!("passphrase accepted");
        Ok(session)
    }
}
