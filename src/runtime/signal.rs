//! Completion signals - set once, observed by any number of waiters
//!
//! The signal is set when [`CompletionSignal`] is dropped, so a backend
//! that returns, fails or panics always releases its dependents.

use tokio::sync::watch;

pub struct CompletionSignal {
    tx: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct CompletionWaiter {
    rx: watch::Receiver<bool>,
}

impl CompletionSignal {
    pub fn new() -> (Self, CompletionWaiter) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CompletionWaiter { rx })
    }

    /// Set the signal now (dropping it does the same)
    pub fn complete(self) {
        self.tx.send_replace(true);
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

impl CompletionWaiter {
    pub fn is_complete(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the signal is set
    pub async fn wait(mut self) {
        // The sender always publishes `true` before it goes away, so an
        // error here can only follow completion.
        let _ = self.rx.wait_for(|done| *done).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn waiters_resolve_after_complete() {
        let (signal, waiter) = CompletionSignal::new();
        let other = waiter.clone();
        assert!(!waiter.is_complete());

        let pending = tokio::spawn(other.wait());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!pending.is_finished());

        signal.complete();
        pending.await.unwrap();
        assert!(waiter.is_complete());
    }

    #[tokio::test]
    async fn late_waiter_resolves_immediately() {
        let (signal, waiter) = CompletionSignal::new();
        drop(signal);

        tokio::time::timeout(Duration::from_secs(1), waiter.wait())
            .await
            .expect("waiter should not block after completion");
    }

    #[tokio::test]
    async fn panic_while_holding_signal_still_completes() {
        let (signal, waiter) = CompletionSignal::new();
        let task = tokio::spawn(async move {
            let _signal = signal;
            panic!("boom");
        });

        assert!(task.await.is_err());
        tokio::time::timeout(Duration::from_secs(1), waiter.wait())
            .await
            .expect("panic must release waiters");
    }
}
