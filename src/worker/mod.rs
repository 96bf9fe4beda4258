use crate::error::RequestError;
use rayon::ThreadPool;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Shared thread pool for CPU-bound work such as template rendering, so the
/// async executor keeps serving other requests meanwhile.
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<ThreadPool>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl WorkerPool {
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn the worker threads.
    pub fn new(num_threads: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads.max(1))
            .thread_name(|i| format!("dirmvc-render-{i}"))
            // Without a handler rayon aborts the process on a panicking job.
            .panic_handler(|_| tracing::error!("render job panicked"))
            .build()
            .unwrap_or_else(|e| panic!("Failed to start render worker pool: {e}"));
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Run `f` on the pool and wait for its result without blocking the
    /// executor.
    pub async fn execute<F, R>(&self, f: F) -> Result<R, RequestError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            // The receiver is gone if the request was dropped.
            let _ = tx.send(f());
        });

        rx.await.map_err(|_| RequestError::WorkerGone)
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}
