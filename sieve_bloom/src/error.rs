use std::io;

/// Result type alias for Bloom filter operations.
pub type Result<T> = std::result::Result<T, BloomError>;

/// Bloom filter errors.
#[derive(Debug, thiserror::Error)]
pub enum BloomError {
    /// Sizing input outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human readable constraint that was violated.
        reason: String,
    },
    /// The hash primitive failed while absorbing input or producing a digest.
    #[error("hash failure: {0}")]
    HashFailure(#[from] io::Error),
}

impl BloomError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        BloomError::InvalidParameter { name, reason: reason.into() }
    }
}
