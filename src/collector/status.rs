//! Per-collector runtime accounting

use std::time::{Duration, SystemTime};

use super::error::CollectorError;

/// Mutable runtime accounting for a single collector.
///
/// Created during registration with `healthy = true` and all counters
/// zeroed; mutated only by the runner; destroyed on unregister. Every value
/// returned to a caller is a copy — no external code ever aliases the
/// registry's internal record.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorStatus {
    pub name: String,
    pub healthy: bool,
    pub last_run: Option<SystemTime>,
    pub last_latency: Option<Duration>,
    pub last_error: Option<CollectorError>,
    pub run_count: u64,
    pub error_count: u64,
}

impl CollectorStatus {
    /// A freshly registered collector's status: healthy, never run.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: true,
            last_run: None,
            last_latency: None,
            last_error: None,
            run_count: 0,
            error_count: 0,
        }
    }

    /// Apply the outcome of one collection cycle.
    pub fn record(&mut self, started: SystemTime, latency: Duration, result: &Result<(), CollectorError>) {
        self.last_run = Some(started);
        self.last_latency = Some(latency);
        self.run_count += 1;
        match result {
            Ok(()) => {
                self.last_error = None;
                self.healthy = true;
            }
            Err(e) => {
                self.last_error = Some(e.clone());
                self.error_count += 1;
                self.healthy = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_status_is_healthy_and_zeroed() {
        let status = CollectorStatus::new("alpha");
        assert!(status.healthy);
        assert_eq!(status.run_count, 0);
        assert_eq!(status.error_count, 0);
        assert!(status.last_run.is_none());
    }

    #[test]
    fn test_record_success_clears_error_and_bumps_run_count() {
        let mut status = CollectorStatus::new("alpha");
        status.record(SystemTime::now(), Duration::from_millis(5), &Ok(()));
        assert!(status.healthy);
        assert_eq!(status.run_count, 1);
        assert_eq!(status.error_count, 0);
        assert!(status.last_error.is_none());
        assert!(status.last_latency.unwrap() >= Duration::from_millis(0));
    }

    #[test]
    fn test_record_failure_sets_unhealthy_and_bumps_error_count() {
        let mut status = CollectorStatus::new("alpha");
        let err = CollectorError::CollectFailure("timeout".into());
        status.record(SystemTime::now(), Duration::from_millis(5), &Err(err.clone()));
        assert!(!status.healthy);
        assert_eq!(status.run_count, 1);
        assert_eq!(status.error_count, 1);
        assert_eq!(status.last_error, Some(err));
    }

    #[test]
    fn test_record_then_recover() {
        let mut status = CollectorStatus::new("alpha");
        status.record(
            SystemTime::now(),
            Duration::from_millis(1),
            &Err(CollectorError::CollectFailure("x".into())),
        );
        status.record(SystemTime::now(), Duration::from_millis(1), &Ok(()));
        assert!(status.healthy);
        assert_eq!(status.run_count, 2);
        assert_eq!(status.error_count, 1);
    }
}
