//! Error types for the cache
//!
//! Construction-time errors only. Producer errors are never wrapped: they
//! reach the caller in the producer's own error type.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised while building a cache.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Capacity must allow at least one entry
    #[error("Invalid capacity: max_entries must be greater than 0, got {0}")]
    InvalidCapacity(usize),

    /// Max age must be a positive, finite duration
    #[error("Invalid max age: {0}")]
    InvalidMaxAge(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache construction.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CacheError::InvalidCapacity(0);
        assert!(err.to_string().contains("max_entries"));

        let err = CacheError::InvalidMaxAge("must be positive, got 0s".to_string());
        assert!(err.to_string().contains("must be positive"));
    }
}
