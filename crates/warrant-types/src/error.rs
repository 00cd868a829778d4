//! Error taxonomy shared by every Warrant crate.
//!
//! | Kind         | Meaning                                   | Retry?          |
//! |--------------|-------------------------------------------|-----------------|
//! | `Validation` | malformed, missing or out-of-range input  | never as-is     |
//! | `NotFound`   | missing workspace, member or share        | no              |
//! | `Forbidden`  | authorization failure                     | no              |
//! | `Conflict`   | duplicate membership, resource or key     | no              |
//! | `Internal`   | signing or persistence failure            | with backoff    |
//! | `Cancelled`  | caller cancelled or deadline elapsed      | with backoff    |
//!
//! Forbidden reasons are generic categories. They never carry the rule that
//! produced the decision.

use thiserror::Error;

/// Result type used across Warrant.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by every public Warrant operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Caller supplied malformed, missing, or out-of-range input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced workspace, member, or share does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The actor is not permitted to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The operation would create a duplicate.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Signing or persistence failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// The request was cancelled or its deadline elapsed.
    #[error("request cancelled")]
    Cancelled,
}

/// Coarse classification of an [`Error`], for transport status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    Internal,
    Cancelled,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Internal(_) => ErrorKind::Internal,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns whether the same request may succeed if retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Internal | ErrorKind::Cancelled)
    }

    /// The bare message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::Validation(m)
            | Error::NotFound(m)
            | Error::Forbidden(m)
            | Error::Conflict(m)
            | Error::Internal(m) => m,
            Error::Cancelled => "request cancelled",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Error::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_internal_and_cancelled_are_retryable() {
        assert!(Error::internal("store down").is_retryable());
        assert!(Error::Cancelled.is_retryable());

        assert!(!Error::validation("bad").is_retryable());
        assert!(!Error::not_found("share").is_retryable());
        assert!(!Error::forbidden("insufficient permission").is_retryable());
        assert!(!Error::conflict("dup").is_retryable());
    }

    #[test]
    fn message_strips_category() {
        let err = Error::forbidden("insufficient permission");
        assert_eq!(err.message(), "insufficient permission");
        assert_eq!(err.to_string(), "forbidden: insufficient permission");
    }
}
