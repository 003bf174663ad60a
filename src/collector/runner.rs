//! Schedules one independent loop per registered collector

use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::CollectorError;
use super::registry::Registry;
use super::update::Update;
use super::Collector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunnerState {
    Unstarted,
    Started,
    Stopped,
}

/// Drives every registered collector at its own cadence, emits updates on
/// the fan-in channel supplied at construction, and keeps the registry's
/// status records current.
pub struct Runner {
    registry: Arc<Registry>,
    updates_tx: mpsc::Sender<Update>,
    state: Mutex<RunnerState>,
    cancel: Mutex<Option<CancellationToken>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Runner {
    pub fn new(registry: Arc<Registry>, updates_tx: mpsc::Sender<Update>) -> Self {
        Self {
            registry,
            updates_tx,
            state: Mutex::new(RunnerState::Unstarted),
            cancel: Mutex::new(None),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Spawn one independent worker per collector present at the moment of
    /// call. Returns immediately. Start on an empty registry is legal.
    pub fn start(&self, parent: CancellationToken) {
        let mut state = self.state.lock().expect("runner state lock poisoned");
        if *state != RunnerState::Unstarted {
            warn!(?state, "start: runner already started or stopped, ignoring");
            return;
        }
        *state = RunnerState::Started;
        drop(state);

        let root = parent.child_token();
        *self.cancel.lock().expect("runner cancel lock poisoned") = Some(root.clone());

        let names = self.registry.list();
        info!(count = names.len(), "start: spawning collector workers");

        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            let Some(collector) = self.registry.get(&name) else {
                continue;
            };
            let registry = Arc::clone(&self.registry);
            let tx = self.updates_tx.clone();
            let token = root.child_token();
            handles.push(tokio::spawn(Self::worker_loop(registry, collector, tx, token)));
        }

        *self.workers.lock().expect("runner workers lock poisoned") = handles;
    }

    /// Signal all workers to halt and wait for them to exit. Idempotent.
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock().expect("runner state lock poisoned");
            if *state == RunnerState::Stopped {
                return;
            }
            *state = RunnerState::Stopped;
        }

        if let Some(token) = self.cancel.lock().expect("runner cancel lock poisoned").as_ref() {
            token.cancel();
        }

        let handles = std::mem::take(&mut *self.workers.lock().expect("runner workers lock poisoned"));
        for handle in handles {
            let _ = handle.await;
        }
        debug!("stop: all workers joined");
    }

    /// Perform a single out-of-band collection for `name`, synchronously.
    /// Returns the data or the failure reason. Updates status and emits an
    /// update identically to a scheduled run. Fails with
    /// `CollectorNotFound` if the name is absent.
    pub async fn run_once(
        &self,
        cancel: CancellationToken,
        name: &str,
    ) -> Result<super::update::Payload, CollectorError> {
        let collector = self
            .registry
            .get(name)
            .ok_or_else(|| CollectorError::CollectorNotFound(name.to_string()))?;

        let result = Self::collect_and_record(&self.registry, &collector, cancel).await;
        let update = Self::update_for(name, &result);
        Self::emit(&self.updates_tx, update);
        result
    }

    /// Snapshot of name -> healthy for all registered collectors.
    pub fn health(&self) -> std::collections::HashMap<String, bool> {
        self.registry
            .all_status()
            .into_iter()
            .map(|s| (s.name, s.healthy))
            .collect()
    }

    async fn worker_loop(
        registry: Arc<Registry>,
        collector: Arc<dyn Collector>,
        tx: mpsc::Sender<Update>,
        cancel: CancellationToken,
    ) {
        let name = collector.name().to_string();
        loop {
            if cancel.is_cancelled() {
                debug!(name = %name, "worker_loop: cancelled before tick");
                return;
            }

            let result = Self::collect_and_record(&registry, &collector, cancel.clone()).await;
            let update = Self::update_for(&name, &result);
            Self::emit(&tx, update);

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(name = %name, "worker_loop: cancelled during tick delay");
                    return;
                }
                _ = tokio::time::sleep(collector.interval()) => {}
            }
        }
    }

    async fn collect_and_record(
        registry: &Registry,
        collector: &Arc<dyn Collector>,
        cancel: CancellationToken,
    ) -> Result<super::update::Payload, CollectorError> {
        let name = collector.name().to_string();
        let started = SystemTime::now();
        let start_instant = Instant::now();

        let result = collector.collect(cancel).await;
        let latency = start_instant.elapsed();

        let outcome: Result<(), CollectorError> = result.as_ref().map(|_| ()).map_err(Clone::clone);
        registry.update_status(&name, |s| s.record(started, latency, &outcome));

        result
    }

    /// Build the `Update` for a completed collection cycle. A
    /// `PartialFailure` carries its own data forward into the update
    /// alongside the error, rather than being reported as a bare failure.
    fn update_for(name: &str, result: &Result<super::update::Payload, CollectorError>) -> Update {
        match result {
            Ok(payload) => Update::success(name, payload.clone()),
            Err(e @ CollectorError::PartialFailure { data, .. }) => Update::partial(name, data.clone(), e.clone()),
            Err(e) => Update::failure(name, e.clone()),
        }
    }

    /// Drop-newest back-pressure: never block scheduling on a full channel.
    fn emit(tx: &mpsc::Sender<Update>, update: Update) {
        match tx.try_send(update) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("emit: updates channel full, dropping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("emit: updates channel closed, dropping update");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::test_support::{FailingCollector, PartialCollector, StaticCollector};
    use std::time::Duration;

    fn runner_with_channel(capacity: usize) -> (Arc<Registry>, Runner, mpsc::Receiver<Update>) {
        let registry = Arc::new(Registry::new());
        let (tx, rx) = mpsc::channel(capacity);
        let runner = Runner::new(Arc::clone(&registry), tx);
        (registry, runner, rx)
    }

    #[tokio::test]
    async fn test_two_collectors_both_emit_updates() {
        let (registry, runner, mut rx) = runner_with_channel(16);
        registry
            .register(Arc::new(StaticCollector::new(
                "alpha",
                Duration::from_millis(50),
                serde_json::json!({"v": "a"}),
            )))
            .unwrap();
        registry
            .register(Arc::new(StaticCollector::new(
                "beta",
                Duration::from_millis(50),
                serde_json::json!({"v": "b"}),
            )))
            .unwrap();

        let root = CancellationToken::new();
        runner.start(root.clone());

        let mut seen = std::collections::HashSet::new();
        let deadline = tokio::time::Instant::now() + Duration::from_millis(400);
        while seen.len() < 2 && tokio::time::Instant::now() < deadline {
            if let Ok(Some(update)) = tokio::time::timeout(Duration::from_millis(400), rx.recv()).await {
                seen.insert(update.source);
            }
        }

        assert!(seen.contains("alpha"));
        assert!(seen.contains("beta"));

        root.cancel();
        runner.stop().await;
    }

    #[tokio::test]
    async fn test_failing_collector_reports_error_others_keep_working() {
        let (registry, runner, mut rx) = runner_with_channel(32);
        registry
            .register(Arc::new(FailingCollector::new("failing", Duration::from_millis(50), "boom")))
            .unwrap();
        registry
            .register(Arc::new(StaticCollector::new(
                "working",
                Duration::from_millis(50),
                serde_json::json!({"ok": true}),
            )))
            .unwrap();

        let root = CancellationToken::new();
        runner.start(root.clone());

        let mut saw_failure = false;
        let mut saw_success = false;
        let deadline = tokio::time::Instant::now() + Duration::from_millis(400);
        while (!saw_failure || !saw_success) && tokio::time::Instant::now() < deadline {
            if let Ok(Some(update)) = tokio::time::timeout(Duration::from_millis(400), rx.recv()).await {
                match (update.source.as_str(), update.is_success()) {
                    ("failing", false) => saw_failure = true,
                    ("working", true) => saw_success = true,
                    _ => {}
                }
            }
        }

        assert!(saw_failure);
        assert!(saw_success);

        let failing_status = registry.status("failing").unwrap();
        assert!(!failing_status.healthy);
        assert!(failing_status.error_count >= 1);

        root.cancel();
        runner.stop().await;
    }

    #[tokio::test]
    async fn test_run_once_not_found() {
        let (_registry, runner, _rx) = runner_with_channel(4);
        let err = runner
            .run_once(CancellationToken::new(), "ghost")
            .await
            .unwrap_err();
        assert_eq!(err, CollectorError::CollectorNotFound("ghost".to_string()));
    }

    #[tokio::test]
    async fn test_run_once_updates_status_and_emits() {
        let (registry, runner, mut rx) = runner_with_channel(4);
        registry
            .register(Arc::new(StaticCollector::new(
                "alpha",
                Duration::from_secs(3600),
                serde_json::json!({"v": 1}),
            )))
            .unwrap();

        let result = runner.run_once(CancellationToken::new(), "alpha").await;
        assert!(result.is_ok());

        let status = registry.status("alpha").unwrap();
        assert_eq!(status.run_count, 1);

        let update = rx.try_recv().unwrap();
        assert_eq!(update.source, "alpha");
        assert!(update.is_success());
    }

    #[tokio::test]
    async fn test_immediate_collection_on_start() {
        let (registry, runner, mut rx) = runner_with_channel(4);
        registry
            .register(Arc::new(StaticCollector::new(
                "alpha",
                Duration::from_secs(3600),
                serde_json::json!({}),
            )))
            .unwrap();

        let root = CancellationToken::new();
        runner.start(root.clone());

        let update = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("expected an update within 500ms")
            .expect("channel should not be closed");
        assert_eq!(update.source, "alpha");

        // No second update should arrive quickly since the interval is 1 hour.
        let second = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(second.is_err());

        root.cancel();
        runner.stop().await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (_registry, runner, _rx) = runner_with_channel(4);
        let root = CancellationToken::new();
        runner.start(root.clone());
        runner.stop().await;
        runner.stop().await;
    }

    #[tokio::test]
    async fn test_start_on_empty_registry_is_legal() {
        let (_registry, runner, _rx) = runner_with_channel(4);
        let root = CancellationToken::new();
        runner.start(root.clone());
        runner.stop().await;
    }

    #[tokio::test]
    async fn test_partial_failure_emits_update_with_both_data_and_error() {
        let (registry, runner, mut rx) = runner_with_channel(4);
        registry
            .register(Arc::new(PartialCollector::new(
                "k8s",
                Duration::from_secs(3600),
                serde_json::json!({"nodes": 3}),
                "2 of 5 nodes unreachable",
            )))
            .unwrap();

        let result = runner.run_once(CancellationToken::new(), "k8s").await;
        assert!(result.is_err());

        let update = rx.try_recv().unwrap();
        assert!(!update.is_success());
        assert_eq!(update.data_json().unwrap()["nodes"], 3);

        let status = registry.status("k8s").unwrap();
        assert!(!status.healthy);
        assert_eq!(status.error_count, 1);
    }

    #[tokio::test]
    async fn test_health_reflects_registry_status() {
        let (registry, runner, _rx) = runner_with_channel(4);
        registry
            .register(Arc::new(StaticCollector::new(
                "alpha",
                Duration::from_secs(3600),
                serde_json::json!({}),
            )))
            .unwrap();

        let health = runner.health();
        assert_eq!(health.get("alpha"), Some(&true));
    }
}
