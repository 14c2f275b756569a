//! The Concurrency Governor: a single fair counting semaphore bounding
//! every in-flight model call, search call, and fetch across an entire
//! invocation.

use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};

/// Cheaply cloneable handle to the invocation-wide semaphore. `tokio::sync::
/// Semaphore` wakes waiters in FIFO order, which is what makes this a fair
/// counting semaphore for free.
#[derive(Clone)]
pub struct Governor {
    semaphore: Arc<Semaphore>,
}

impl Governor {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(capacity.max(1))) }
    }

    /// Acquires one permit, blocking (asynchronously) until a slot is free.
    /// The permit is released on drop, including on the caller's error or
    /// timeout paths — callers just hold the guard across the governed call.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore
            .acquire()
            .await
            .expect("governor semaphore is never closed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn never_exceeds_capacity() {
        let governor = Governor::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let governor = governor.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _permit = governor.acquire().await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }
}
