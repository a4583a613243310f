//! Worker pool for the proxy vanity search.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use serde::Serialize;

use crate::config::SearchParameters;
use crate::matcher::Address;

use super::cpu::{CpuWorker, WorkerStats};

/// First nonce whose CREATE2 address matched the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub nonce: u64,
    /// The 32-byte CREATE2 salt derived from `nonce`.
    pub salt: [u8; 32],
    /// The predicted proxy address.
    pub address: [u8; 20],
    /// Worker ID that found it.
    pub worker_id: usize,
}

/// Machine-readable form of a [`SearchResult`].
#[derive(Debug, Serialize)]
pub struct MatchReport {
    pub nonce: u64,
    pub salt: String,
    pub address: String,
    pub worker: usize,
}

impl SearchResult {
    /// Salt as 0x-prefixed hex.
    pub fn salt_hex(&self) -> String {
        format!("0x{}", hex::encode(self.salt))
    }

    /// Address as checksummed hex (0x...).
    pub fn address_checksum(&self) -> String {
        Address::from_bytes(self.address).to_checksum()
    }

    pub fn report(&self) -> MatchReport {
        MatchReport {
            nonce: self.nonce,
            salt: self.salt_hex(),
            address: self.address_checksum(),
            worker: self.worker_id,
        }
    }
}

/// Outcome of a bounded wait on the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    Found(SearchResult),
    /// Nothing happened within the timeout; workers are still running.
    Pending,
    /// Every worker exited without a match (stopped or nonces exhausted).
    Finished,
}

pub struct WorkerPool {
    num_workers: usize,
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<SearchResult>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    start_time: Instant,
}

impl WorkerPool {
    /// Spawns `params.workers` threads, each scanning its own residue class.
    pub fn new(params: SearchParameters, init_code_hash: [u8; 32]) -> io::Result<Self> {
        Self::with_stop_flag(params, init_code_hash, Arc::new(AtomicBool::new(false)))
    }

    /// Like [`WorkerPool::new`], but workers also stop once `stop_flag` is
    /// raised from outside (e.g. by a signal handler).
    pub fn with_stop_flag(
        params: SearchParameters,
        init_code_hash: [u8; 32],
        stop_flag: Arc<AtomicBool>,
    ) -> io::Result<Self> {
        let num_workers = params.workers;
        let params = Arc::new(params);
        // Only the worker winning `found` ever sends.
        let (result_tx, result_rx) = bounded(1);
        let found = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());

        let mut handles = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let worker = CpuWorker::new(
                id,
                params.clone(),
                init_code_hash,
                result_tx.clone(),
                stop_flag.clone(),
                found.clone(),
                stats.clone(),
            );
            let spawned = thread::Builder::new()
                .name(format!("bob-vanity-worker-{}", id))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop_flag.store(true, Ordering::Relaxed);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(e);
                }
            }
        }

        drop(result_tx);

        Ok(Self {
            num_workers,
            handles: Some(handles),
            result_rx,
            stop_flag,
            stats,
            start_time: Instant::now(),
        })
    }

    pub fn wait_for_result(&self, timeout: Duration) -> PoolEvent {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => PoolEvent::Found(result),
            Err(RecvTimeoutError::Timeout) => PoolEvent::Pending,
            Err(RecvTimeoutError::Disconnected) => PoolEvent::Finished,
        }
    }

    /// Blocks until a match is found or every worker has exited, then joins
    /// the workers.
    pub fn wait(self) -> Option<SearchResult> {
        let result = self.result_rx.recv().ok();
        self.join();
        result
    }

    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    pub fn join(mut self) {
        self.stop();
        self.join_handles();
    }

    fn join_handles(&mut self) {
        if let Some(h) = self.handles.take() {
            for handle in h {
                let _ = handle.join();
            }
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }
    pub fn total_nonces(&self) -> u64 {
        self.stats.total_nonces()
    }
    pub fn total_matches(&self) -> u64 {
        self.stats.total_matches()
    }
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
    pub fn nonces_per_second(&self) -> f64 {
        let t = self.elapsed().as_secs_f64();
        if t > 0.0 {
            self.total_nonces() as f64 / t
        } else {
            0.0
        }
    }
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        self.join_handles();
    }
}
