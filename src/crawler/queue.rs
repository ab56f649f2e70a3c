//! Work queues connecting the dispatcher and the fetch workers
//!
//! Both queues are unbounded. The dispatcher is the only consumer of results
//! and the only producer of tasks, so a fixed-capacity task queue could leave
//! it blocked on a full queue while every worker is blocked handing it a
//! result.

use crate::crawler::task::{CrawlResult, CrawlTask};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Sending half of the results queue (one clone per worker)
pub type ResultSender = mpsc::UnboundedSender<CrawlResult>;

/// Receiving half of the results queue (owned by the dispatcher)
pub type ResultReceiver = mpsc::UnboundedReceiver<CrawlResult>;

/// Creates the task queue
pub fn task_queue() -> (TaskSender, TaskReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        TaskSender { tx },
        TaskReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Creates the results queue
pub fn result_queue() -> (ResultSender, ResultReceiver) {
    mpsc::unbounded_channel()
}

/// Producer side of the task queue
///
/// Dropping every `TaskSender` closes the queue; workers drain what is left
/// and then see the end of the stream.
#[derive(Debug, Clone)]
pub struct TaskSender {
    tx: mpsc::UnboundedSender<CrawlTask>,
}

impl TaskSender {
    /// Enqueues a task without blocking
    ///
    /// Hands the task back if no worker is left to receive it.
    pub fn push(&self, task: CrawlTask) -> Result<(), CrawlTask> {
        self.tx.send(task).map_err(|e| e.0)
    }
}

/// Consumer side of the task queue, shared by all workers
#[derive(Debug, Clone)]
pub struct TaskReceiver {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<CrawlTask>>>,
}

impl TaskReceiver {
    /// Waits for the next task; `None` once the queue is closed and empty
    pub async fn next(&self) -> Option<CrawlTask> {
        self.rx.lock().await.recv().await
    }

    #[cfg(test)]
    pub(crate) fn try_next(&self) -> Option<CrawlTask> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }
}
