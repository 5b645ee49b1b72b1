//! Worker Pool: a fixed set of long-lived workers, each owning a private
//! pre-allocated buffer, serving ingestion requests through a bounded task
//! queue.
//!
//! The pool both parallelizes and rate-limits ingestion: submission blocks
//! when the queue is full rather than dropping or spilling tasks.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};

/// Size of a worker's private buffer: 5 MiB + 1. The extra byte makes
/// reading strictly more than 5 MiB observable as overflow rather than
/// silently truncated.
pub const WORKER_BUFFER_SIZE: usize = 5 * 1024 * 1024 + 1;

/// A pre-allocated byte buffer owned exclusively by one worker, reused
/// across tasks and never shared or resized.
pub struct WorkerBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl WorkerBuffer {
    pub(crate) fn new() -> Self {
        Self { bytes: vec![0u8; WORKER_BUFFER_SIZE], len: 0 }
    }

    /// Resets the buffer to empty for a new task.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Appends `data`, failing with `BufferOverflow` if the resulting length
    /// would reach the buffer's capacity. The buffer is sized one byte past
    /// the 5 MiB limit so that writing strictly more than 5 MiB is always
    /// observable as overflow rather than silently accepted.
    pub fn extend(&mut self, data: &[u8]) -> Result<()> {
        if self.len + data.len() >= self.bytes.len() {
            return Err(Error::BufferOverflow);
        }
        self.bytes[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

type TaskFn = Box<dyn FnOnce(&mut WorkerBuffer) + Send>;

/// A one-shot unit of ingestion work: a closure given exclusive access to
/// the worker's buffer. The closure carries its own completion signal so
/// that [`WorkerPool::submit`] can be generic over the task's return type.
struct WorkerTask {
    work: TaskFn,
}

/// Fixed-size pool of `W` long-lived workers, each consuming tasks from a
/// shared bounded queue FIFO and running each to completion before
/// accepting another.
#[derive(Clone)]
pub struct WorkerPool {
    sender: mpsc::Sender<WorkerTask>,
}

impl WorkerPool {
    /// Spawns `size` workers, each owning a private [`WorkerBuffer`], fed by
    /// a bounded channel of depth `queue_capacity`.
    pub fn new(size: usize, queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<WorkerTask>(queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        for id in 0..size {
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move {
                let mut buffer = WorkerBuffer::new();
                loop {
                    let task = {
                        let mut receiver = receiver.lock().await;
                        receiver.recv().await
                    };
                    let Some(task) = task else {
                        tracing::debug!(worker_id = id, "worker shutting down, channel closed");
                        break;
                    };

                    buffer.reset();
                    (task.work)(&mut buffer);
                }
            });
        }

        Self { sender }
    }

    /// Enqueues `work` and blocks until a worker has run it to completion,
    /// returning whatever `work` produced. Submission itself blocks if the
    /// queue is full; this is the pool's only admission-control policy.
    pub async fn submit<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut WorkerBuffer) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (done, done_rx) = oneshot::channel::<Result<T>>();
        let task = WorkerTask {
            work: Box::new(move |buf| {
                let _ = done.send(work(buf));
            }),
        };

        self.sender
            .send(task)
            .await
            .map_err(|_| Error::Internal("worker pool is shut down".into()))?;

        done_rx
            .await
            .map_err(|_| Error::Internal("worker pool dropped task without completing it".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_overflow_is_detected() {
        let mut buf = WorkerBuffer::new();
        let five_mib = vec![0u8; WORKER_BUFFER_SIZE - 1];
        assert!(buf.extend(&five_mib).is_ok());
        assert!(buf.extend(&[1]).is_err());
    }

    #[test]
    fn buffer_reset_clears_len() {
        let mut buf = WorkerBuffer::new();
        buf.extend(b"hello").unwrap();
        assert_eq!(buf.as_slice(), b"hello");
        buf.reset();
        assert_eq!(buf.as_slice(), b"");
    }

    #[tokio::test]
    async fn submitted_task_runs_and_signals_completion() {
        let pool = WorkerPool::new(2, 8);
        let result = pool
            .submit(|buf| {
                buf.extend(b"payload")?;
                Ok(())
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn each_task_sees_a_freshly_reset_buffer() {
        let pool = WorkerPool::new(1, 8);
        pool.submit(|buf| buf.extend(b"first")).await.unwrap();
        pool.submit(|buf| {
            assert_eq!(buf.as_slice(), b"");
            buf.extend(b"second")
        })
        .await
        .unwrap();
    }
}
