use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("worker pool is saturated ({capacity} tasks in flight)")]
pub struct WorkerPoolSaturated {
    pub capacity: usize,
}

/// A dedicated runtime for business handlers, bounded by a semaphore.
///
/// Handlers never run on the I/O runtime. A request that finds no free
/// slot is rejected immediately so the caller can answer `Overloaded`.
#[derive(Debug)]
pub struct WorkerPool {
    runtime: Option<Runtime>,
    handle: Handle,
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// A reserved place in the pool. Dropping it unused releases the slot.
#[derive(Debug)]
pub struct WorkerSlot {
    handle: Handle,
    permit: OwnedSemaphorePermit,
}

impl WorkerSlot {
    pub fn spawn<F>(self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = self.permit;
        self.handle.spawn(async move {
            task.await;
            drop(permit);
        });
    }
}

impl WorkerPool {
    pub fn new(threads: usize, capacity: usize) -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads.max(1))
            .thread_name("wirebolt-business")
            .enable_time()
            .build()?;

        let capacity = capacity.max(1);

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn try_reserve(&self) -> Result<WorkerSlot, WorkerPoolSaturated> {
        let permit = Arc::clone(&self.slots)
            .try_acquire_owned()
            .map_err(|_| WorkerPoolSaturated {
                capacity: self.capacity,
            })?;

        Ok(WorkerSlot {
            handle: self.handle.clone(),
            permit,
        })
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
