//! Ordered notification dispatch
//!
//! Notifications are routed to a fixed set of worker threads by a hash of the
//! lower-cased symbol path. A given variable always lands on the same worker,
//! so its events are handled in arrival order; different variables may be
//! handled in parallel when more than one worker is running.

use crate::recorder::{ChangeRecorder, Outcome};
use crate::status::StatusReporter;
use crate::types::Notification;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Per-outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub logged: usize,
    pub suppressed: usize,
    pub unregistered: usize,
    pub empty: usize,
    pub decode_failed: usize,
    pub sink_failed: usize,
}

impl DispatchStats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Logged(_) => self.logged += 1,
            Outcome::Suppressed => self.suppressed += 1,
            Outcome::Unregistered => self.unregistered += 1,
            Outcome::Empty => self.empty += 1,
            Outcome::DecodeFailed(_) => self.decode_failed += 1,
            Outcome::SinkFailed(_) => self.sink_failed += 1,
        }
    }

    pub fn merge(&mut self, other: &DispatchStats) {
        self.logged += other.logged;
        self.suppressed += other.suppressed;
        self.unregistered += other.unregistered;
        self.empty += other.empty;
        self.decode_failed += other.decode_failed;
        self.sink_failed += other.sink_failed;
    }

    /// Notifications processed
    pub fn total(&self) -> usize {
        self.logged
            + self.suppressed
            + self.unregistered
            + self.empty
            + self.decode_failed
            + self.sink_failed
    }
}

/// Pool of ordered workers feeding a shared recorder
pub struct Dispatcher {
    senders: Vec<Sender<Notification>>,
    workers: Vec<JoinHandle<DispatchStats>>,
}

impl Dispatcher {
    /// Start `workers` threads (at least one)
    pub fn spawn<R>(recorder: Arc<ChangeRecorder<R>>, workers: usize) -> Self
    where
        R: StatusReporter + 'static,
    {
        let count = workers.max(1);
        let mut senders = Vec::with_capacity(count);
        let mut handles = Vec::with_capacity(count);

        for index in 0..count {
            let (tx, rx) = mpsc::channel::<Notification>();
            let recorder = Arc::clone(&recorder);

            handles.push(thread::spawn(move || {
                let mut stats = DispatchStats::default();
                for notification in rx {
                    let outcome = recorder.handle(&notification);
                    stats.record(&outcome);
                }
                log::debug!("Dispatch worker {} drained: {:?}", index, stats);
                stats
            }));
            senders.push(tx);
        }

        log::debug!("Started {} dispatch worker(s)", count);
        Self {
            senders,
            workers: handles,
        }
    }

    /// Queue a notification. Returns false if its worker has stopped.
    pub fn submit(&self, notification: Notification) -> bool {
        let shard = self.shard_for(&notification.symbol_path);
        self.senders[shard].send(notification).is_ok()
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.senders.len()
    }

    fn shard_for(&self, symbol_path: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        symbol_path.to_lowercase().hash(&mut hasher);
        (hasher.finish() % self.senders.len() as u64) as usize
    }

    /// Close the queues and wait for every queued notification to be handled.
    pub fn shutdown(self) -> DispatchStats {
        drop(self.senders);

        let mut total = DispatchStats::default();
        for (index, worker) in self.workers.into_iter().enumerate() {
            match worker.join() {
                Ok(stats) => total.merge(&stats),
                Err(_) => log::error!("Dispatch worker {} panicked", index),
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RecorderConfig, VariableConfig};
    use crate::recorder::SymbolInfo;
    use crate::sink::RotatingLog;
    use crate::status::LogReporter;
    use tempfile::TempDir;

    #[test]
    fn test_same_symbol_same_shard() {
        let dir = TempDir::new().unwrap();
        let sink = RotatingLog::open(&RecorderConfig::new().with_directory(dir.path())).unwrap();
        let recorder = Arc::new(ChangeRecorder::new(sink, LogReporter));
        let dispatcher = Dispatcher::spawn(recorder, 4);

        assert_eq!(dispatcher.workers(), 4);
        assert_eq!(
            dispatcher.shard_for("MAIN.fTemp"),
            dispatcher.shard_for("main.FTEMP")
        );
        dispatcher.shutdown();
    }

    #[test]
    fn test_zero_workers_clamped() {
        let dir = TempDir::new().unwrap();
        let sink = RotatingLog::open(&RecorderConfig::new().with_directory(dir.path())).unwrap();
        let dispatcher = Dispatcher::spawn(Arc::new(ChangeRecorder::new(sink, LogReporter)), 0);
        assert_eq!(dispatcher.workers(), 1);
        assert_eq!(dispatcher.shutdown(), DispatchStats::default());
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let dir = TempDir::new().unwrap();
        let sink = RotatingLog::open(&RecorderConfig::new().with_directory(dir.path())).unwrap();
        let mut recorder = ChangeRecorder::new(sink, LogReporter);
        recorder.register(&VariableConfig::new("MAIN.n"), &SymbolInfo::new("ADST_UINT8", "USINT"));

        let dispatcher = Dispatcher::spawn(Arc::new(recorder), 2);
        for i in 0..50u8 {
            assert!(dispatcher.submit(Notification::new("MAIN.n", "ADST_UINT8", "USINT", vec![i])));
        }
        assert!(dispatcher.submit(Notification::new("MAIN.other", "ADST_UINT8", "USINT", vec![1])));

        let stats = dispatcher.shutdown();
        assert_eq!(stats.logged, 50);
        assert_eq!(stats.unregistered, 1);
        assert_eq!(stats.total(), 51);
    }
}
