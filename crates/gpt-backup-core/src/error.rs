//! Error taxonomy for a harvest run.
//!
//! Every variant is fatal: the run stops at the first one and nothing
//! collected so far is archived.

use thiserror::Error;

pub use gpt_backup_auth::AuthError;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Token acquisition failed before any fetching started.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// A listing page could not be fetched; ids gathered so far are dropped.
    #[error("failed to fetch conversation page at offset {offset}: {reason}")]
    PageFetch { offset: u64, reason: String },

    /// Every allowed attempt of a retried operation failed.
    #[error("failed after {attempts} attempts: {last_error}")]
    FetchExhausted { attempts: u32, last_error: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
