//! Join barrier for one collection cycle
//!
//! Every participant registers before it starts and receives a
//! [`BarrierGuard`]. Dropping the guard marks the participant as done, so a
//! collector that returns early, fails or panics still arrives exactly once.
//! [`JoinBarrier::wait`] resolves once every issued guard has been dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    notify: Notify,
}

/// Counting barrier awaited by the coordinator
#[derive(Debug, Clone, Default)]
pub struct JoinBarrier {
    inner: Arc<Inner>,
}

impl JoinBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one participant
    pub fn register(&self) -> BarrierGuard {
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        BarrierGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Participants still outstanding
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Wait until every registered participant has arrived
    ///
    /// Returns immediately when nothing is outstanding.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // register interest before checking the count so a concurrent
            // final arrival cannot slip between the check and the await
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }

            notified.await;
        }
    }
}

/// Registration handle; arrives at the barrier when dropped
#[derive(Debug)]
pub struct BarrierGuard {
    inner: Arc<Inner>,
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        if self.inner.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_without_participants() {
        let barrier = JoinBarrier::new();
        barrier.wait().await;
        assert_eq!(barrier.pending(), 0);
    }

    #[tokio::test]
    async fn test_register_and_drop() {
        let barrier = JoinBarrier::new();
        let a = barrier.register();
        let b = barrier.register();
        assert_eq!(barrier.pending(), 2);

        drop(a);
        assert_eq!(barrier.pending(), 1);
        drop(b);
        assert_eq!(barrier.pending(), 0);

        barrier.wait().await;
    }

    #[tokio::test]
    async fn test_wait_does_not_advance_early() {
        let barrier = JoinBarrier::new();
        let guard = barrier.register();
        let released = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&released);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            drop(guard);
        });

        barrier.wait().await;
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_guard_dropped_on_panic() {
        let barrier = JoinBarrier::new();
        let guard = barrier.register();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("collector failure");
        });

        assert!(handle.await.is_err());
        tokio::time::timeout(Duration::from_secs(1), barrier.wait())
            .await
            .expect("barrier should release after panic");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_participants() {
        let barrier = JoinBarrier::new();
        let coordinator = barrier.register();

        for i in 0..64u64 {
            let guard = barrier.register();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(i % 7)).await;
                drop(guard);
            });
        }

        drop(coordinator);
        tokio::time::timeout(Duration::from_secs(5), barrier.wait())
            .await
            .expect("barrier should release");
        assert_eq!(barrier.pending(), 0);
    }
}
