//! # Domain Errors
//!
//! Error taxonomy for the MetaID SDK. Every facade operation either
//! completes with a concrete result or rejects with exactly one of these
//! conditions; callers surface the message verbatim or map it to UI text.

use thiserror::Error;

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, MetaidError>;

/// MetaID SDK error conditions.
#[derive(Debug, Error)]
pub enum MetaidError {
    /// No active wallet session.
    #[error("You need to connect to a wallet first.")]
    NotConnected,

    /// Operation is invalid for the active schema.
    #[error("This feature is not supported yet.")]
    NotSupported,

    /// No wallet provider is injected into the current host.
    #[error("This feature is only available in browser.")]
    NotInBrowser,

    /// Signing key path not found within the child-address search depth.
    #[error("Cannot derive the path from the given address.")]
    CannotDerivePath,

    /// Referenced input has no resolvable prior output.
    #[error("No output provided.")]
    NoOutput,

    /// Session address cannot fund the dust output.
    #[error("Not enough balance.")]
    InsufficientBalance,

    /// Post-broadcast confirmation never became visible on the indexer.
    #[error("Failed to create root.")]
    RootCreationFailed,

    /// A required payload field is empty or malformed.
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Field that failed validation.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The composer was asked for something its current contents cannot
    /// answer (txid of an empty transaction, second data output, ...).
    #[error("Invalid transaction state: {0}")]
    InvalidState(String),

    /// Draft transport encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Indexer or wallet transport failure.
    #[error("Network error: {0}")]
    Network(String),
}

impl MetaidError {
    /// Shorthand for a [`MetaidError::Validation`] error.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
