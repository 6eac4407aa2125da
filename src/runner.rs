//! Parallel execution capability.
//!
//! The engine never owns threads; a runner is injected through [`Config`]
//! and only has to promise that `task(i, worker)` runs exactly once per
//! index, in any order. Without a runner the scheduler falls back to inline
//! execution of the same tasks, producing identical results.
//!
//! [`Config`]: crate::Config

/// Injected parallel-for capability.
pub trait ParallelRunner: Send + Sync {
    /// Invoke `task(index, worker)` exactly once for every
    /// `index ∈ [0, task_count)`. Task order and worker assignment are
    /// unconstrained.
    fn parallel_for(&self, task_count: u32, task: &(dyn Fn(u32, u32) + Sync));

    fn worker_count(&self) -> u32;
}

/// Rayon-backed runner. Uses an owned thread pool when built with
/// [`RayonRunner::with_threads`], the global pool otherwise.
#[cfg(feature = "parallel")]
pub struct RayonRunner {
    pool: Option<rayon::ThreadPool>,
}

#[cfg(feature = "parallel")]
impl RayonRunner {
    /// Runner over rayon's global thread pool.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Runner over an owned pool with a fixed worker count.
    pub fn with_threads(threads: usize) -> crate::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|_| crate::Error::Unsupported)?;
        Ok(Self { pool: Some(pool) })
    }
}

#[cfg(feature = "parallel")]
impl Default for RayonRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "parallel")]
impl ParallelRunner for RayonRunner {
    fn parallel_for(&self, task_count: u32, task: &(dyn Fn(u32, u32) + Sync)) {
        use rayon::prelude::*;

        let body = || {
            (0..task_count).into_par_iter().for_each(|index| {
                let worker = rayon::current_thread_index().unwrap_or(0) as u32;
                task(index, worker);
            });
        };
        match &self.pool {
            Some(pool) => pool.install(body),
            None => body(),
        }
    }

    fn worker_count(&self) -> u32 {
        match &self.pool {
            Some(pool) => pool.current_num_threads() as u32,
            None => rayon::current_num_threads() as u32,
        }
    }
}

#[cfg(all(test, feature = "parallel"))]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn every_index_runs_exactly_once() {
        let runner = RayonRunner::with_threads(4).unwrap();
        let hits: Vec<AtomicU32> = (0..97).map(|_| AtomicU32::new(0)).collect();
        runner.parallel_for(97, &|index, _worker| {
            hits[index as usize].fetch_add(1, Ordering::Relaxed);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
        assert_eq!(runner.worker_count(), 4);
    }
}
