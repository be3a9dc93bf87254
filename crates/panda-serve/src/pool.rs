// Copyright (c) 2025 Zensical and contributors

// SPDX-License-Identifier: MIT
// Third-party contributions licensed under DCO

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NON-INFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

// ----------------------------------------------------------------------------

//! Worker pool.

use crossbeam::channel::{Receiver, Sender, unbounded};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, Builder, JoinHandle};
use std::{fmt, num};
use tokio::sync::oneshot;
use tracing::{debug, error};

mod error;

pub use error::{Error, Result};

// ----------------------------------------------------------------------------
// Type aliases
// ----------------------------------------------------------------------------

/// Job executed on a worker thread.
type Job = Box<dyn FnOnce() + Send>;

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Worker pool.
///
/// The worker pool runs blocking work, i.e., synchronous endpoints and file
/// reads, on a fixed number of threads, so the connection scheduler is never
/// blocked. Jobs are distributed over a [`crossbeam`] channel, and results are
/// handed back through a [`oneshot`] channel, which the submitting task awaits
/// without blocking other tasks.
///
/// Pools are cheap to clone, as all clones share the same threads. A panic
/// inside a job is caught on the worker thread, so it never takes down the
/// worker, and is reported as [`Error::Panicked`] to the submitting task.
///
/// # Examples
///
/// ```
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use panda_serve::pool::Pool;
///
/// // Create worker pool
/// let pool = Pool::new(2)?;
/// assert_eq!(pool.size(), 2);
///
/// // Shut down worker pool
/// pool.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Pool {
    /// Shared state.
    inner: Arc<Inner>,
}

/// Worker pool shared state.
struct Inner {
    /// Job sender, removed on shutdown.
    sender: Mutex<Option<Sender<Job>>>,
    /// Join handles of worker threads.
    threads: Mutex<Vec<JoinHandle<()>>>,
    /// Number of worker threads.
    size: usize,
}

// ----------------------------------------------------------------------------
// Implementations
// ----------------------------------------------------------------------------

impl Pool {
    /// Creates a worker pool with the given number of threads.
    ///
    /// At least one thread is always created.
    ///
    /// # Errors
    ///
    /// This method returns [`Error::Io`], if a thread can't be spawned.
    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(1);
        let (sender, receiver) = unbounded();

        // Spawn worker threads, which all pull from the same channel
        let threads = (0..size)
            .map(|n| {
                let receiver = receiver.clone();
                Builder::new()
                    .name(format!("panda/worker-{n}"))
                    .spawn(move || work(&receiver))
            })
            .collect::<std::io::Result<Vec<_>>>()?;

        // Return worker pool
        debug!(size, "worker pool started");
        Ok(Self {
            inner: Arc::new(Inner {
                sender: Mutex::new(Some(sender)),
                threads: Mutex::new(threads),
                size,
            }),
        })
    }

    /// Returns the default number of threads, i.e., the available parallelism.
    #[must_use]
    pub fn default_size() -> usize {
        thread::available_parallelism().map_or(1, num::NonZero::get)
    }

    /// Runs the given function on a worker thread and awaits its result.
    ///
    /// The job is submitted immediately, not when the returned future is first
    /// polled, so it runs even if the future is never awaited.
    ///
    /// # Errors
    ///
    /// The future resolves to [`Error::Disconnected`], if the worker pool was
    /// shut down, and [`Error::Panicked`], if the function panicked.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use panda_serve::pool::Pool;
    ///
    /// // Create worker pool and runtime
    /// let pool = Pool::new(1)?;
    /// let rt = tokio::runtime::Builder::new_current_thread().build()?;
    ///
    /// // Run function on worker thread
    /// let value = rt.block_on(pool.spawn(|| 6 * 7))?;
    /// assert_eq!(value, 42);
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn<F, T>(
        &self, f: F,
    ) -> impl Future<Output = Result<T>> + Send + use<F, T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let submitted = self.submit(Box::new(move || {
            // The receiver is gone if the awaiting task was dropped, in which
            // case there's nobody left to care about the result
            let _ = sender.send(f());
        }));

        // The sender is dropped without sending if the job panicked
        async move {
            submitted?;
            receiver.await.map_err(|_| Error::Panicked)
        }
    }

    /// Shuts the worker pool down.
    ///
    /// Jobs that were already submitted are drained before the threads exit,
    /// and this method blocks until all threads have exited. Afterwards, all
    /// submissions fail with [`Error::Disconnected`].
    pub fn shutdown(&self) {
        drop(lock(&self.inner.sender).take());
        let threads = std::mem::take(&mut *lock(&self.inner.threads));
        for thread in threads {
            if thread.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }
        debug!("worker pool shut down");
    }

    /// Submits a job to the worker threads.
    fn submit(&self, job: Job) -> Result {
        let sender = lock(&self.inner.sender).clone();
        sender
            .ok_or(Error::Disconnected)
            .and_then(|sender| sender.send(job).map_err(Into::into))
    }
}

#[allow(clippy::must_use_candidate)]
impl Pool {
    /// Returns the number of worker threads.
    #[inline]
    pub fn size(&self) -> usize {
        self.inner.size
    }
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl fmt::Debug for Pool {
    /// Formats the worker pool for debugging.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Pool")
            .field("size", &self.inner.size)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Runs jobs until the channel is disconnected and drained.
fn work(receiver: &Receiver<Job>) {
    for job in receiver {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("job panicked on worker thread");
        }
    }
}

/// Locks the given mutex, ignoring poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_spawn() {
        let pool = Pool::new(2).unwrap();
        let name = pool
            .spawn(|| thread::current().name().map(String::from))
            .await
            .unwrap();
        assert!(name.is_some_and(|name| name.starts_with("panda/worker-")));
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_panic() {
        let pool = Pool::new(1).unwrap();
        let res = pool.spawn(|| -> u8 { panic!("boom") }).await;
        assert!(matches!(res, Err(Error::Panicked)));

        // The worker survives the panic
        assert_eq!(pool.spawn(|| 1).await.unwrap(), 1);
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_drains() {
        let pool = Pool::new(1).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let (sender, receiver) = unbounded::<()>();

        // Block the only worker, and queue a job behind it
        let blocker = pool.spawn(move || receiver.recv().is_err());
        let queued = {
            let counter = Arc::clone(&counter);
            pool.spawn(move || counter.fetch_add(1, Ordering::SeqCst))
        };

        // Release the worker and shut down, which drains the queued job
        drop(sender);
        let shutdown = {
            let pool = pool.clone();
            tokio::task::spawn_blocking(move || pool.shutdown())
        };
        shutdown.await.unwrap();
        assert!(blocker.await.unwrap());
        assert_eq!(queued.await.unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // New jobs are rejected
        assert!(matches!(pool.spawn(|| ()).await, Err(Error::Disconnected)));
    }
}
