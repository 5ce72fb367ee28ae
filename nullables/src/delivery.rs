//! Nullable delivery: records what would have been sent.

use cvup_delivery::{DeliveryError, DeliveryService};
use cvup_types::{DocumentType, EmailAddress};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A delivery service that keeps successful deliveries in memory.
pub struct NullDelivery {
    sent: Mutex<Vec<(EmailAddress, DocumentType)>>,
    failures_left: AtomicU32,
    delay: Mutex<Duration>,
    attempts: AtomicUsize,
}

impl NullDelivery {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_left: AtomicU32::new(0),
            delay: Mutex::new(Duration::ZERO),
            attempts: AtomicUsize::new(0),
        }
    }

    /// The next `count` attempts fail with a transport error.
    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Sleep this long before each attempt completes.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Successful deliveries, in order.
    pub fn sent(&self) -> Vec<(EmailAddress, DocumentType)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// All attempts, failed ones included.
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for NullDelivery {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryService for NullDelivery {
    fn name(&self) -> &str {
        "null-delivery"
    }

    async fn deliver(
        &self,
        email: &EmailAddress,
        document_type: DocumentType,
    ) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DeliveryError::Transport("simulated outage".into()));
        }

        self.sent
            .lock()
            .unwrap()
            .push((email.clone(), document_type));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fails_requested_number_of_times() {
        let delivery = NullDelivery::new();
        let email = EmailAddress::parse("a@x.com").unwrap();
        delivery.fail_next(1);

        assert!(delivery.deliver(&email, DocumentType::Junior).await.is_err());
        delivery.deliver(&email, DocumentType::Junior).await.unwrap();

        assert_eq!(delivery.attempt_count(), 2);
        assert_eq!(delivery.sent(), vec![(email, DocumentType::Junior)]);
    }
}
