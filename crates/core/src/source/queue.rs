//! Per-source serialized execution queue
//!
//! Every state-changing operation on a source is submitted to the source's
//! own queue. The single worker executes tasks strictly in FIFO submission
//! order, never starting one before the previous task has fully settled —
//! including all of its internal suspension points. Queues on different
//! sources are independent.

use std::future::Future;

use futures::future::BoxFuture;
use tokio::sync::oneshot;

type QueueTask = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("serialized queue worker has shut down")]
    Closed,
}

/// Handle to a single-worker FIFO task queue
///
/// Cloning shares the same worker. Requires a running tokio runtime at
/// construction time.
#[derive(Clone)]
pub struct SerialQueue {
    tx: flume::Sender<QueueTask>,
}

impl SerialQueue {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let (tx, rx) = flume::unbounded::<QueueTask>();
        tokio::spawn(async move {
            while let Ok(task) = rx.recv_async().await {
                task().await;
            }
            tracing::debug!(queue = %label, "serialized queue closed");
        });
        Self { tx }
    }

    /// Enqueue a task and wait for its result
    ///
    /// The returned future resolves once the task has fully settled on the
    /// worker. Tasks run to completion; there is no cancellation or timeout.
    pub async fn run<F, Fut, T>(&self, make: F) -> Result<T, QueueError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let task: QueueTask = Box::new(move || {
            Box::pin(async move {
                let result = make().await;
                let _ = done_tx.send(result);
            })
        });
        self.tx.send(task).map_err(|_| QueueError::Closed)?;
        done_rx.await.map_err(|_| QueueError::Closed)
    }
}
