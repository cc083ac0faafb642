use mindmap_store::StoreError;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not authenticated: enter the passphrase first")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session slot error: {0}")]
    Slot(#[from] std::io::Error),

    #[error("Could not determine application data directory")]
    NoDataDir,

    #[error("State lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, ClientError>;
