//! Bounded Concurrent Dispatcher
//!
//! Runs one worker per item on a fixed-width pool and collects results in completion
//! order, keeping each result paired with the item that produced it. Worker errors and
//! panics are converted into `WorkerFault` data at this boundary; the dispatcher itself
//! never fails. Dropping a dispatch in progress aborts its in-flight workers.

use crate::progress::ProgressSink;
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

/// Unexpected failure of a single worker, kept as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFault {
    pub message: String,
}

impl WorkerFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn from_join(err: JoinError) -> Self {
        if err.is_cancelled() {
            return Self::new("worker task was cancelled");
        }
        let panic = err.into_panic();
        let message = if let Some(s) = panic.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else {
            "worker panicked".to_string()
        };
        Self::new(format!("worker panicked: {}", message))
    }
}

impl fmt::Display for WorkerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One finished unit of work.
#[derive(Debug)]
pub struct Completed<I, O> {
    pub item: I,
    pub result: Result<O, WorkerFault>,
}

/// Fixed-width worker pool.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    max_workers: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_WORKERS)
    }
}

impl Dispatcher {
    pub const DEFAULT_MAX_WORKERS: usize = 10;

    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run `worker` for every item with at most `max_workers` in flight.
    ///
    /// Returns exactly one `Completed` per item, in completion order. `progress`
    /// advances by one per completed item.
    pub async fn dispatch<I, O, E, F, Fut>(
        &self,
        label: &str,
        items: Vec<I>,
        worker: F,
        progress: &dyn ProgressSink,
    ) -> Vec<Completed<I, O>>
    where
        I: Clone + fmt::Display + Send + 'static,
        O: Send + 'static,
        E: fmt::Display + Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
    {
        let total = items.len();
        progress.begin(label, total);
        let mut pass = PassProgress::new(progress);
        debug!(label, total, max_workers = self.max_workers, "dispatch started");

        let mut queue = items.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut completed = Vec::with_capacity(total);

        for item in queue.by_ref().take(self.max_workers) {
            in_flight.push(spawn_worker(item, &worker));
        }

        while let Some((item, joined)) = in_flight.next().await {
            let result = match joined {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(err)) => Err(WorkerFault::new(err.to_string())),
                Err(join_error) => Err(WorkerFault::from_join(join_error)),
            };
            if let Err(fault) = &result {
                warn!(label, item = %item, error = %fault, "worker fault");
            }
            progress.advance(1);
            completed.push(Completed { item, result });

            if let Some(next) = queue.next() {
                in_flight.push(spawn_worker(next, &worker));
            }
        }

        pass.finish();
        debug!(label, total, "dispatch finished");
        completed
    }
}

fn spawn_worker<I, O, E, F, Fut>(
    item: I,
    worker: &F,
) -> impl Future<Output = (I, Result<Result<O, E>, JoinError>)>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
{
    let task = AbortOnDrop(tokio::spawn(worker(item.clone())));
    async move { (item, task.await) }
}

/// Finishes the sink of a completed pass; abandons it when the pass is dropped early.
struct PassProgress<'a> {
    sink: &'a dyn ProgressSink,
    done: bool,
}

impl<'a> PassProgress<'a> {
    fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink, done: false }
    }

    fn finish(&mut self) {
        self.done = true;
        self.sink.finish();
    }
}

impl Drop for PassProgress<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.sink.abandon();
        }
    }
}

/// Join handle that aborts its task when dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
