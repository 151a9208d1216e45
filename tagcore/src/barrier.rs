//! One-shot readiness barrier.
//!
//! A [`ReadyBarrier`] settles exactly once, to success or to a failure, and
//! every waiter (current or future) observes that same outcome. It is built
//! on a `tokio::sync::watch` channel holding `None` until settlement.

use tokio::sync::watch;

use crate::errors::{TagcoreError, TagcoreResult};

/// Settle-once barrier broadcasting an initialization outcome.
#[derive(Debug)]
pub struct ReadyBarrier {
    outcome: watch::Sender<Option<TagcoreResult<()>>>,
}

impl ReadyBarrier {
    /// Creates an unsettled barrier.
    pub fn new() -> Self {
        let (outcome, _) = watch::channel(None);
        Self { outcome }
    }

    /// Settles the barrier with `outcome`.
    ///
    /// Returns `false` and leaves the barrier untouched if it had already
    /// settled.
    pub fn settle(&self, outcome: TagcoreResult<()>) -> bool {
        let mut pending = Some(outcome);
        self.outcome.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = pending.take();
            true
        })
    }

    /// Whether the barrier has settled.
    pub fn is_settled(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Waits for the barrier to settle and returns its outcome.
    ///
    /// Resolves immediately if the barrier has already settled.
    pub async fn wait(&self) -> TagcoreResult<()> {
        let mut receiver = self.outcome.subscribe();
        let outcome = receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|_| TagcoreError::Interrupted)?
            .clone();
        outcome.unwrap_or(Err(TagcoreError::Interrupted))
    }
}

impl Default for ReadyBarrier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[test]
    fn settles_only_once() {
        let barrier = ReadyBarrier::new();
        assert!(!barrier.is_settled());

        assert!(barrier.settle(Err(TagcoreError::NotFound("ipadic".to_string()))));
        assert!(!barrier.settle(Ok(())));
        assert!(barrier.is_settled());

        let mut wait = task::spawn(barrier.wait());
        assert_ready_eq!(
            wait.poll(),
            Err(TagcoreError::NotFound("ipadic".to_string()))
        );
    }

    #[test]
    fn waiters_stay_pending_until_settled() {
        let barrier = ReadyBarrier::new();
        let mut first = task::spawn(barrier.wait());
        let mut second = task::spawn(barrier.wait());

        assert_pending!(first.poll());
        assert_pending!(second.poll());

        barrier.settle(Ok(()));

        assert!(first.is_woken());
        assert!(second.is_woken());
        assert_ready_eq!(first.poll(), Ok(()));
        assert_ready_eq!(second.poll(), Ok(()));
    }

    #[tokio::test]
    async fn every_concurrent_waiter_sees_the_same_failure() {
        let barrier = Arc::new(ReadyBarrier::new());
        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move { barrier.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        barrier.settle(Err(TagcoreError::IncompleteManifest {
            missing: vec!["sys.dic".to_string()],
        }));

        for waiter in waiters {
            let outcome = waiter.await.unwrap();
            assert_eq!(
                outcome,
                Err(TagcoreError::IncompleteManifest {
                    missing: vec!["sys.dic".to_string()],
                })
            );
        }
    }

    #[tokio::test]
    async fn late_waiters_resolve_immediately() {
        let barrier = ReadyBarrier::new();
        barrier.settle(Ok(()));

        assert_eq!(barrier.wait().await, Ok(()));
        assert_eq!(barrier.wait().await, Ok(()));
    }
}
