use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Serializes callers so consecutive requests start at least `min_gap` apart.
///
/// Shared by every worker that talks to the same upstream; the lock is held
/// across the sleep, so waiting callers queue in lock order.
#[derive(Debug)]
pub struct RequestGate {
    last: Mutex<Option<Instant>>,
    min_gap: Duration,
}

impl RequestGate {
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            last: Mutex::new(None),
            min_gap,
        }
    }

    /// Wait until a request slot is free and claim it.
    pub async fn wait_for_slot(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_gap {
                tokio::time::sleep(self.min_gap.saturating_sub(elapsed)).await;
            }
        }
        *last = Some(Instant::now());
    }
}
