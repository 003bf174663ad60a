//! The `Update` record emitted once per collection cycle

use std::any::Any;
use std::sync::Arc;
use std::time::SystemTime;

use serde_json::Value;

use super::error::CollectorError;

/// The opaque payload a `Collector` produces on success.
///
/// Concrete collector implementations are out of scope for this crate, so
/// the payload is carried dynamically. Most collectors will serialize their
/// result to JSON (`Payload::Json`); a collector that wants to avoid a
/// serialization round-trip for a large or non-serializable result can
/// instead hand back a type-erased value via `Payload::Any` and have the
/// consumer downcast it with `Update::data_any`.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Any(Arc<dyn Any + Send + Sync>),
}

impl Payload {
    pub fn json(value: impl Into<Value>) -> Self {
        Payload::Json(value.into())
    }

    pub fn any<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Any(Arc::new(value))
    }
}

/// Immutable record emitted on the fan-in channel per collection cycle.
///
/// The consumer type-dispatches on `source`.
#[derive(Debug, Clone)]
pub struct Update {
    pub source: String,
    pub data: Option<Payload>,
    pub timestamp: SystemTime,
    pub error: Option<CollectorError>,
}

impl Update {
    pub fn success(source: impl Into<String>, data: Payload) -> Self {
        Self {
            source: source.into(),
            data: Some(data),
            timestamp: SystemTime::now(),
            error: None,
        }
    }

    pub fn failure(source: impl Into<String>, error: CollectorError) -> Self {
        Self {
            source: source.into(),
            data: None,
            timestamp: SystemTime::now(),
            error: Some(error),
        }
    }

    /// A cycle that gathered some data but wants to surface a sub-failure
    /// rather than swallow it: both `data` and `error` are populated.
    pub fn partial(source: impl Into<String>, data: Payload, error: CollectorError) -> Self {
        Self {
            source: source.into(),
            data: Some(data),
            timestamp: SystemTime::now(),
            error: Some(error),
        }
    }

    /// Borrow the payload as JSON, if it was produced as `Payload::Json`.
    pub fn data_json(&self) -> Option<&Value> {
        match &self.data {
            Some(Payload::Json(v)) => Some(v),
            _ => None,
        }
    }

    /// Attempt to downcast the payload to a concrete type, if it was
    /// produced as `Payload::Any`.
    pub fn data_any<T: Any + Send + Sync>(&self) -> Option<&T> {
        match &self.data {
            Some(Payload::Any(v)) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_update_has_no_error() {
        let update = Update::success("alpha", Payload::json(serde_json::json!({"a": 1})));
        assert!(update.is_success());
        assert_eq!(update.data_json().unwrap()["a"], 1);
    }

    #[test]
    fn test_failure_update_has_no_data() {
        let update = Update::failure("alpha", CollectorError::CollectFailure("boom".into()));
        assert!(!update.is_success());
        assert!(update.data_json().is_none());
    }

    #[test]
    fn test_partial_update_carries_both_data_and_error() {
        let update = Update::partial(
            "k8s",
            Payload::json(serde_json::json!({"nodes": 3})),
            CollectorError::PartialFailure {
                data: Payload::json(serde_json::json!({"nodes": 3})),
                reason: "2 of 5 nodes unreachable".to_string(),
            },
        );
        assert!(!update.is_success());
        assert_eq!(update.data_json().unwrap()["nodes"], 3);
    }

    #[test]
    fn test_any_payload_round_trips() {
        #[derive(Debug, PartialEq)]
        struct Reading(u32);

        let update = Update::success("sensor", Payload::any(Reading(42)));
        assert_eq!(update.data_any::<Reading>(), Some(&Reading(42)));
        assert_eq!(update.data_any::<String>(), None);
    }
}
