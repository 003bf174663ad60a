//! Collector orchestration runtime
//!
//! A `Collector` is a polymorphic data source advertising a name, a polling
//! interval, and a cancellable collection operation. The `Registry` owns the
//! set of registered collectors and their runtime status; the `Runner`
//! drives each collector at its own cadence and fans results into a shared
//! channel of [`Update`] records.

mod error;
mod registry;
mod runner;
mod status;
mod update;

pub use error::CollectorError;
pub use registry::Registry;
pub use runner::Runner;
pub use status::CollectorStatus;
pub use update::{Payload, Update};

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A single heterogeneous data source.
///
/// Implementations are expected to aggregate partial sub-failures into the
/// data payload rather than failing the whole cycle when feasible; a total
/// failure (`Err`) is reserved for connectivity failures where no data was
/// gathered at all.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Stable, unique, non-empty name identifying this source.
    fn name(&self) -> &str;

    /// Minimum wall-clock delay between successive collections. Must be
    /// positive; a runner treats a non-positive interval as a
    /// implementation bug and will panic when scheduling it.
    fn interval(&self) -> Duration;

    /// Perform one collection. Must return promptly once `cancel` is
    /// tripped.
    async fn collect(&self, cancel: CancellationToken) -> Result<Payload, CollectorError>;

    /// Health as observed by the collector itself, independent of the
    /// registry's own status bookkeeping. True before the first run.
    fn healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// A collector that always succeeds with a fixed payload.
    pub struct StaticCollector {
        name: String,
        interval: Duration,
        payload: serde_json::Value,
        pub calls: Arc<AtomicU32>,
    }

    impl StaticCollector {
        pub fn new(name: impl Into<String>, interval: Duration, payload: serde_json::Value) -> Self {
            Self {
                name: name.into(),
                interval,
                payload,
                calls: Arc::new(AtomicU32::new(0)),
            }
        }
    }

    #[async_trait]
    impl Collector for StaticCollector {
        fn name(&self) -> &str {
            &self.name
        }

        fn interval(&self) -> Duration {
            self.interval
        }

        async fn collect(&self, _cancel: CancellationToken) -> Result<Payload, CollectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Payload::Json(self.payload.clone()))
        }
    }

    /// A collector that always reports a partial failure, carrying a fixed
    /// payload alongside a fixed reason.
    pub struct PartialCollector {
        name: String,
        interval: Duration,
        payload: serde_json::Value,
        reason: String,
    }

    impl PartialCollector {
        pub fn new(name: impl Into<String>, interval: Duration, payload: serde_json::Value, reason: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                interval,
                payload,
                reason: reason.into(),
            }
        }
    }

    #[async_trait]
    impl Collector for PartialCollector {
        fn name(&self) -> &str {
            &self.name
        }

        fn interval(&self) -> Duration {
            self.interval
        }

        async fn collect(&self, _cancel: CancellationToken) -> Result<Payload, CollectorError> {
            Err(CollectorError::PartialFailure {
                data: Payload::Json(self.payload.clone()),
                reason: self.reason.clone(),
            })
        }

        fn healthy(&self) -> bool {
            false
        }
    }

    /// A collector that always fails with a fixed reason.
    pub struct FailingCollector {
        name: String,
        interval: Duration,
        reason: String,
    }

    impl FailingCollector {
        pub fn new(name: impl Into<String>, interval: Duration, reason: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                interval,
                reason: reason.into(),
            }
        }
    }

    #[async_trait]
    impl Collector for FailingCollector {
        fn name(&self) -> &str {
            &self.name
        }

        fn interval(&self) -> Duration {
            self.interval
        }

        async fn collect(&self, _cancel: CancellationToken) -> Result<Payload, CollectorError> {
            Err(CollectorError::CollectFailure(self.reason.clone()))
        }

        fn healthy(&self) -> bool {
            false
        }
    }
}
