//! Collector runtime error types

use thiserror::Error;

use super::update::Payload;

/// Errors surfaced by the registry and runner
#[derive(Debug, Error, Clone)]
pub enum CollectorError {
    #[error("collector '{0}' is already registered")]
    DuplicateName(String),

    #[error("collector '{0}' not found")]
    CollectorNotFound(String),

    #[error("collection failed: {0}")]
    CollectFailure(String),

    /// A sub-failure a collector chose to surface rather than swallow into
    /// its payload. Carries the partial data it did manage to gather
    /// alongside the reason, so the consumer is not left with nothing.
    #[error("partial failure: {reason}")]
    PartialFailure { data: Payload, reason: String },

    #[error("collection cancelled")]
    Cancelled,
}

impl CollectorError {
    /// Whether this error represents a registry-level failure (returned
    /// synchronously to the caller) as opposed to a per-collection failure
    /// recorded in status and reported via an `Update`.
    pub fn is_registry_error(&self) -> bool {
        matches!(
            self,
            CollectorError::DuplicateName(_) | CollectorError::CollectorNotFound(_)
        )
    }
}

// `Payload::Any` carries a type-erased `Arc<dyn Any>`, which has no
// meaningful equality, so `PartialFailure` compares by reason only.
impl PartialEq for CollectorError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DuplicateName(a), Self::DuplicateName(b)) => a == b,
            (Self::CollectorNotFound(a), Self::CollectorNotFound(b)) => a == b,
            (Self::CollectFailure(a), Self::CollectFailure(b)) => a == b,
            (Self::PartialFailure { reason: a, .. }, Self::PartialFailure { reason: b, .. }) => a == b,
            (Self::Cancelled, Self::Cancelled) => true,
            _ => false,
        }
    }
}

impl Eq for CollectorError {}
