//! Chunk scheduler for parallel column work.
//!
//! Items (columns on compress, column records on decode) are dealt
//! round-robin into exactly `parallelism` chunks: chunk `i` receives the
//! items whose index modulo `parallelism` equals `i`. Each chunk runs as
//! one job on a rayon pool created once per scheduler, and the results are
//! merged back by item index, so the output never depends on completion
//! order.
//!
//! # Failure handling
//!
//! A failing chunk records its index in a shared latch. Before each item a
//! chunk checks the latch and stops if a chunk with a *lower* index has
//! failed; chunks below the failure keep going. Once every job has
//! returned, the failure of the lowest-indexed chunk is reported as
//! [`AlsError::WorkerFailure`] and all partial output is dropped.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::{AlsError, Result};

/// A partition of the work items plus its slot index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<T> {
    /// Slot index of this chunk.
    pub index: usize,
    /// `(item_index, item)` pairs in ascending item order.
    pub items: Vec<(usize, T)>,
}

/// Outcome of running one chunk.
enum ChunkOutcome<U> {
    Completed(Vec<(usize, U)>),
    Failed(AlsError),
    Cancelled,
}

/// Lowest index of a failed chunk, `usize::MAX` when none failed.
struct FailureLatch(AtomicUsize);

impl FailureLatch {
    fn new() -> Self {
        Self(AtomicUsize::new(usize::MAX))
    }

    fn record(&self, chunk: usize) {
        self.0.fetch_min(chunk, Ordering::AcqRel);
    }

    /// Whether a chunk below `chunk` has failed.
    fn cancels(&self, chunk: usize) -> bool {
        self.0.load(Ordering::Acquire) < chunk
    }
}

/// Runs chunk jobs on a fixed-size worker pool.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct ChunkScheduler {
    parallelism: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl ChunkScheduler {
    /// Create a scheduler with `parallelism` chunks and workers.
    ///
    /// A parallelism of 0 is treated as 1. With one chunk, or if the pool
    /// cannot be built, chunks run on the calling thread in index order,
    /// which produces identical output.
    pub fn new(parallelism: usize) -> Self {
        let parallelism = parallelism.max(1);
        let pool = if parallelism > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(parallelism)
                .thread_name(|i| format!("als-worker-{}", i))
                .build()
            {
                Ok(pool) => Some(Arc::new(pool)),
                Err(e) => {
                    warn!(
                        "failed to build a pool of {} workers, running chunks sequentially: {}",
                        parallelism, e
                    );
                    None
                }
            }
        } else {
            None
        };
        Self { parallelism, pool }
    }

    /// Number of chunks per call.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Whether chunks run on a worker pool.
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Deal items round-robin into exactly `parallelism` chunks.
    pub fn partition<T>(&self, items: Vec<T>) -> Vec<Chunk<T>> {
        let mut chunks: Vec<Chunk<T>> = (0..self.parallelism)
            .map(|index| Chunk {
                index,
                items: Vec::new(),
            })
            .collect();
        for (i, item) in items.into_iter().enumerate() {
            chunks[i % self.parallelism].items.push((i, item));
        }
        chunks
    }

    /// Apply `job` to every item and return the results in item order.
    ///
    /// # Errors
    ///
    /// Returns `WorkerFailure` wrapping the first error of the
    /// lowest-indexed failing chunk.
    pub fn run<T, U, F>(&self, items: Vec<T>, job: F) -> Result<Vec<U>>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> Result<U> + Sync,
    {
        let total = items.len();
        let chunks = self.partition(items);
        let latch = FailureLatch::new();
        debug!(
            "scheduling {} item(s) across {} chunk(s){}",
            total,
            chunks.len(),
            if self.is_parallel() { "" } else { " sequentially" }
        );

        let outcomes: Vec<ChunkOutcome<U>> = match &self.pool {
            Some(pool) => pool.install(|| {
                chunks
                    .into_par_iter()
                    .map(|chunk| run_chunk(chunk, &job, &latch))
                    .collect()
            }),
            None => chunks
                .into_iter()
                .map(|chunk| run_chunk(chunk, &job, &latch))
                .collect(),
        };

        merge(outcomes, total)
    }
}

impl fmt::Debug for ChunkScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkScheduler")
            .field("parallelism", &self.parallelism)
            .field("parallel", &self.is_parallel())
            .finish()
    }
}

fn run_chunk<T, U, F>(chunk: Chunk<T>, job: &F, latch: &FailureLatch) -> ChunkOutcome<U>
where
    F: Fn(T) -> Result<U>,
{
    let mut results = Vec::with_capacity(chunk.items.len());
    for (index, item) in chunk.items {
        if latch.cancels(chunk.index) {
            debug!("chunk {} cancelled after a lower chunk failed", chunk.index);
            return ChunkOutcome::Cancelled;
        }
        match job(item) {
            Ok(result) => results.push((index, result)),
            Err(e) => {
                warn!("chunk {} failed on item {}: {}", chunk.index, index, e);
                latch.record(chunk.index);
                return ChunkOutcome::Failed(e);
            }
        }
    }
    ChunkOutcome::Completed(results)
}

fn merge<U>(outcomes: Vec<ChunkOutcome<U>>, total: usize) -> Result<Vec<U>> {
    let mut slots: Vec<Option<U>> = (0..total).map(|_| None).collect();
    for (chunk, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            ChunkOutcome::Completed(results) => {
                for (index, result) in results {
                    slots[index] = Some(result);
                }
            }
            ChunkOutcome::Failed(source) => {
                return Err(AlsError::WorkerFailure {
                    chunk,
                    source: Box::new(source),
                });
            }
            // Only chunks above a failed one are cancelled, and that
            // failure is returned first.
            ChunkOutcome::Cancelled => {}
        }
    }
    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_partition_round_robin() {
        let scheduler = ChunkScheduler::new(3);
        let chunks = scheduler.partition((0..7).collect::<Vec<_>>());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].items, vec![(0, 0), (3, 3), (6, 6)]);
        assert_eq!(chunks[1].items, vec![(1, 1), (4, 4)]);
        assert_eq!(chunks[2].items, vec![(2, 2), (5, 5)]);
    }

    #[test]
    fn test_partition_creates_empty_chunks() {
        let scheduler = ChunkScheduler::new(4);
        let chunks = scheduler.partition(vec!['a']);
        assert_eq!(chunks.len(), 4);
        assert!(chunks[1].items.is_empty());
        assert!(chunks[3].items.is_empty());
    }

    #[test]
    fn test_zero_parallelism_is_sequential() {
        let scheduler = ChunkScheduler::new(0);
        assert_eq!(scheduler.parallelism(), 1);
        assert!(!scheduler.is_parallel());
    }

    #[test]
    fn test_run_preserves_order() {
        for parallelism in 1..=5 {
            let scheduler = ChunkScheduler::new(parallelism);
            let results = scheduler
                .run((0..23u64).collect(), |i| {
                    // Later items finish first.
                    thread::sleep(Duration::from_micros(50 * (23 - i)));
                    Ok(i * i)
                })
                .unwrap();
            assert_eq!(results, (0..23u64).map(|i| i * i).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_run_empty() {
        let scheduler = ChunkScheduler::new(3);
        let results: Vec<u8> = scheduler.run(Vec::<u8>::new(), Ok).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_lowest_chunk_failure_wins() {
        let scheduler = ChunkScheduler::new(4);
        // Items 1 and 2 fail; item 2 fails fast, item 1 slowly.
        let err = scheduler
            .run((0..8usize).collect(), |i| match i {
                1 => {
                    thread::sleep(Duration::from_millis(20));
                    Err(AlsError::corrupt(i, "slow failure"))
                }
                2 => Err(AlsError::corrupt(i, "fast failure")),
                _ => Ok(i),
            })
            .unwrap_err();
        match err {
            AlsError::WorkerFailure { chunk, source } => {
                assert_eq!(chunk, 1);
                assert!(source.to_string().contains("slow failure"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_failure_reported_identically_when_sequential() {
        let scheduler = ChunkScheduler::new(1);
        let err = scheduler
            .run((0..4usize).collect(), |i| {
                if i >= 2 {
                    Err(AlsError::corrupt(i, "bad"))
                } else {
                    Ok(i)
                }
            })
            .unwrap_err();
        assert!(matches!(err, AlsError::WorkerFailure { chunk: 0, .. }));
        assert!(matches!(err.root(), AlsError::CorruptStream { line: 2, .. }));
    }

    #[test]
    fn test_higher_chunks_cancelled_after_failure() {
        let scheduler = ChunkScheduler::new(1);
        let seen = Mutex::new(Vec::new());
        let _ = scheduler.run((0..4usize).collect(), |i| {
            if let Ok(mut seen) = seen.lock() {
                seen.push(i);
            }
            if i == 1 {
                Err(AlsError::shape("boom"))
            } else {
                Ok(i)
            }
        });
        // A single chunk stops at its own failure.
        assert_eq!(seen.into_inner().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_latch() {
        let latch = FailureLatch::new();
        assert!(!latch.cancels(0));
        latch.record(3);
        latch.record(5);
        assert!(latch.cancels(4));
        assert!(!latch.cancels(3));
        assert!(!latch.cancels(1));
    }

    #[test]
    fn test_scheduler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChunkScheduler>();
    }
}
