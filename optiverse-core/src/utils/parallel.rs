#[cfg(test)]
#[path = "../../tests/unit/utils/parallel_test.rs"]
mod parallel_test;

use rayon::prelude::*;
use rayon::{ThreadPool as RayonThreadPool, ThreadPoolBuilder};

/// Represents a thread pool wrapper.
pub struct ThreadPool {
    inner: Option<RayonThreadPool>,
}

impl ThreadPool {
    /// Creates a new instance of `ThreadPool`. Falls back to the global rayon pool when a
    /// dedicated one cannot be built.
    pub fn new(num_threads: usize) -> Self {
        Self { inner: ThreadPoolBuilder::new().num_threads(num_threads.max(1)).build().ok() }
    }

    /// Executes given operation on thread pool.
    pub fn execute<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.inner {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

/// Maps collection and collects results into vector in parallel, keeping the source order.
pub fn parallel_into_collect<T, F, R>(source: Vec<T>, map_op: F) -> Vec<R>
where
    T: Send + Sync,
    F: Fn(T) -> R + Sync + Send,
    R: Send,
{
    source.into_par_iter().map(map_op).collect()
}
