//! Cancellable delayed action.
//!
//! Arming replaces any pending action. Only the wait is cancellable: once
//! the delay elapses the action is spawned on its own task and runs to
//! completion even if the handle is re-armed or cancelled meanwhile.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Owned handle to at most one pending delayed action.
#[derive(Default)]
pub struct DelayedAction {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DelayedAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay`, cancelling any action still waiting.
    pub fn arm<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action);
        });

        if let Some(previous) = self.lock().replace(timer) {
            previous.abort();
        }
    }

    /// Cancel the waiting action, if any. Returns whether one was waiting.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    /// Whether an action is still waiting for its delay to elapse.
    pub fn is_pending(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for DelayedAction {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter_action(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let action = DelayedAction::new();

        action.arm(Duration::from_millis(2000), counter_action(&fired));
        assert!(action.is_pending());

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!action.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_the_window() {
        let fired = Arc::new(AtomicUsize::new(0));
        let action = DelayedAction::new();

        action.arm(Duration::from_millis(2000), counter_action(&fired));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        action.arm(Duration::from_millis(2000), counter_action(&fired));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let action = DelayedAction::new();

        action.arm(Duration::from_millis(100), counter_action(&fired));
        assert!(action.cancel());
        assert!(!action.cancel());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_action_survives_rearm() {
        let finished = Arc::new(AtomicUsize::new(0));
        let action = DelayedAction::new();

        let slow = {
            let finished = finished.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(1000)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
        };
        action.arm(Duration::from_millis(100), slow);
        tokio::time::sleep(Duration::from_millis(200)).await;

        // The slow action is mid-flight; re-arming must not abort it.
        action.arm(Duration::from_millis(5000), async {});
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
