//! Worker pool and CPU worker for the proxy vanity search.

mod cpu;
mod pool;

pub use cpu::{nonce_partition, CpuWorker, WorkerStats};
pub use pool::{MatchReport, PoolEvent, SearchResult, WorkerPool};
