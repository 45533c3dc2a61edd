//! Access policy for parsed requests.
//!
//! # Responsibilities
//! - Decide whether a method token may reach the record store
//!
//! # Design Decisions
//! - Pure predicate: no I/O, no state
//! - Method tokens compare case-sensitively, as sent on the wire

/// The single retrieval verb the server answers.
pub const ALLOWED_METHOD: &str = "GET";

/// Result of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied,
}

/// Trait for deciding whether a method is permitted.
pub trait AccessPolicy: Send + Sync + std::fmt::Debug {
    /// Returns the access decision for `method`.
    fn check(&self, method: &str) -> Access;
}

/// Allows only [`ALLOWED_METHOD`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyPolicy;

impl AccessPolicy for ReadOnlyPolicy {
    fn check(&self, method: &str) -> Access {
        if method == ALLOWED_METHOD {
            Access::Allowed
        } else {
            Access::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_get_is_allowed() {
        let policy = ReadOnlyPolicy;
        assert_eq!(policy.check("GET"), Access::Allowed);

        for method in ["POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "get", "GETS", ""] {
            assert_eq!(policy.check(method), Access::Denied, "{method:?}");
        }
    }
}
