use mindmap_shared::CodecError;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Transport-level HTTP failure (DNS, TLS, timeout, body decoding).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote table answered with a non-success status.
    #[error("Remote store responded {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("Database lock poisoned")]
    LockPoisoned,

    /// The stored ciphertext could not be opened with the given passphrase.
    #[error("Decryption failed; the passphrase is likely wrong")]
    DecryptionFailed,

    /// Sealing a document failed.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl StoreError {
    /// `true` when the error means "wrong passphrase or corrupt ciphertext"
    /// rather than a connectivity problem.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, StoreError::DecryptionFailed)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
