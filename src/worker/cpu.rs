//! CPU worker scanning one residue class of the nonce space.

use std::iter::StepBy;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use log::{debug, info};

use crate::config::SearchParameters;
use crate::crypto::{create2_address, salt_from_nonce};
use crate::matcher::Address;

use super::SearchResult;

#[derive(Debug, Default)]
pub struct WorkerStats {
    pub nonces_tried: AtomicU64,
    pub matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn total_nonces(&self) -> u64 {
        self.nonces_tried.load(Ordering::Relaxed)
    }
    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// Nonces assigned to `worker` out of `workers`: `worker, worker + workers, ...`
/// ascending, bounded by `max_nonce` (exclusive) when given.
///
/// Panics if `workers` is zero.
pub fn nonce_partition(
    worker: usize,
    workers: usize,
    max_nonce: Option<u64>,
) -> StepBy<RangeInclusive<u64>> {
    let start = worker as u64;
    let range = match max_nonce.map(|end| end.checked_sub(1)) {
        None => start..=u64::MAX,
        Some(Some(last)) => start..=last,
        Some(None) => exhausted_range(),
    };
    range.step_by(workers)
}

/// A range that yields nothing.
fn exhausted_range() -> RangeInclusive<u64> {
    let mut range = 0..=0;
    range.next();
    range
}

pub struct CpuWorker {
    id: usize,
    params: Arc<SearchParameters>,
    init_code_hash: [u8; 32],
    result_tx: Sender<SearchResult>,
    stop_flag: Arc<AtomicBool>,
    found: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        params: Arc<SearchParameters>,
        init_code_hash: [u8; 32],
        result_tx: Sender<SearchResult>,
        stop_flag: Arc<AtomicBool>,
        found: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            params,
            init_code_hash,
            result_tx,
            stop_flag,
            found,
            stats,
        }
    }

    /// Runs until a match is found by any worker, the stop flag is raised, or
    /// this worker's share of the nonce space is exhausted.
    pub fn run(&self) {
        const BATCH_SIZE: u64 = 1000;

        let workers = self.params.workers;
        let progress_every = self.params.progress_every.max(1);
        let mut nonces = nonce_partition(self.id, workers, self.params.max_nonce);
        let mut iteration: u64 = 0;

        'search: loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                break;
            }

            let mut tried = 0;
            for _ in 0..BATCH_SIZE {
                let Some(nonce) = nonces.next() else {
                    self.stats.nonces_tried.fetch_add(tried, Ordering::Relaxed);
                    debug!("worker {} exhausted its nonces", self.id);
                    break 'search;
                };

                if iteration % progress_every == 0 {
                    info!("progress ({}/{}) - {}", self.id + 1, workers, nonce);
                }
                iteration += 1;
                tried += 1;

                let salt = salt_from_nonce(nonce);
                let addr = create2_address(&self.params.factory, &salt, &self.init_code_hash);

                if self.params.pattern.matches(&Address::from_bytes(addr)).is_match() {
                    self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
                    self.stats.nonces_tried.fetch_add(tried, Ordering::Relaxed);
                    self.publish(SearchResult {
                        nonce,
                        salt,
                        address: addr,
                        worker_id: self.id,
                    });
                    break 'search;
                }
            }

            self.stats.nonces_tried.fetch_add(tried, Ordering::Relaxed);
        }
    }

    /// First writer wins; later matches are dropped.
    fn publish(&self, result: SearchResult) {
        if self
            .found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let _ = self.result_tx.send(result);
            self.stop_flag.store(true, Ordering::Relaxed);
        } else {
            debug!(
                "worker {} discarded match at nonce {}",
                self.id, result.nonce
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_partition_covers_range_once() {
        for workers in [1usize, 3, 7, 10] {
            let mut seen = HashSet::new();
            for w in 0..workers {
                for n in nonce_partition(w, workers, Some(1000)) {
                    assert_eq!(n as usize % workers, w);
                    assert!(seen.insert(n), "nonce {} tested twice", n);
                }
            }
            assert_eq!(seen.len(), 1000);
            assert!(seen.iter().all(|&n| n < 1000));
        }
    }

    #[test]
    fn test_partition_ascending_from_worker_id() {
        let got: Vec<u64> = nonce_partition(2, 10, None).take(3).collect();
        assert_eq!(got, vec![2, 12, 22]);
    }

    #[test]
    fn test_partition_reaches_u64_max() {
        let mut nonces = nonce_partition(3, 4, None);
        assert_eq!(nonces.nth((u64::MAX / 4) as usize), Some(u64::MAX));
        assert_eq!(nonces.next(), None);
    }

    #[test]
    fn test_partition_bounds() {
        assert_eq!(nonce_partition(0, 4, Some(0)).count(), 0);
        assert_eq!(nonce_partition(3, 4, Some(0)).count(), 0);
        assert_eq!(nonce_partition(5, 10, Some(3)).count(), 0);
        assert_eq!(nonce_partition(1, 2, Some(2)).collect::<Vec<_>>(), vec![1]);
    }
}
