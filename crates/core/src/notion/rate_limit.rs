//! Request gate for the tabular store.
//!
//! The store enforces a strict request budget, so outbound traffic goes
//! through a gate combining a bounded-concurrency semaphore with a minimum
//! inter-request spacing. The spacing is reserved under a mutex over the
//! last scheduled request time, so concurrent acquirers queue up evenly
//! spaced slots instead of stampeding when the semaphore frees up.

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::time::{sleep, Duration, Instant};

/// Permit for one in-flight request. Dropping it frees the slot.
pub struct RequestPermit<'a> {
    _permit: SemaphorePermit<'a>,
}

/// Bounded-concurrency gate with minimum inter-request spacing.
pub struct RequestGate {
    semaphore: Semaphore,
    last_scheduled: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RequestGate {
    pub fn new(max_in_flight: usize, min_interval: Duration) -> Self {
        Self {
            semaphore: Semaphore::new(max_in_flight),
            last_scheduled: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait for a concurrency slot and for the spacing interval, then
    /// return a permit for one request.
    pub async fn acquire(&self) -> RequestPermit<'_> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .expect("gate semaphore is never closed");

        let wait = {
            let mut last = self.last_scheduled.lock().await;
            let now = Instant::now();
            let slot = match *last {
                Some(prev) if prev + self.min_interval > now => prev + self.min_interval,
                _ => now,
            };
            *last = Some(slot);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            sleep(wait).await;
        }

        RequestPermit { _permit: permit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let gate = RequestGate::new(2, Duration::from_millis(100));
        let start = Instant::now();
        let _permit = gate.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_spacing_between_requests() {
        let gate = RequestGate::new(4, Duration::from_millis(50));
        let start = Instant::now();

        drop(gate.acquire().await);
        drop(gate.acquire().await);
        drop(gate.acquire().await);

        // Three requests need two spacing intervals
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_concurrency_bounded() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let gate = Arc::new(RequestGate::new(2, Duration::ZERO));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await;
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
