//! # Chat Interrupts
//!
//! File: cli/src/commands/chat/interrupt.rs
//! Author: Christi Mahu
//!
//! Ctrl-C is delivered to the session through an [`Interrupt`]. Raising it is
//! sticky: the flag stays set, and a raise that happens while nobody is
//! waiting is still seen by the next wait or check. The session checks it
//! while reading, while training and while a reply is produced, and the
//! response engine polls the same flag to abandon a reply early.
//!
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Interrupt {
    raised: AtomicBool,
    notify: Notify,
}

impl Interrupt {
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
        // Stores a permit when nobody is waiting yet.
        self.notify.notify_one();
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// The underlying flag, for blocking code that polls it.
    pub fn flag(&self) -> &AtomicBool {
        &self.raised
    }

    /// Completes once the interrupt has been raised. Cancel-safe.
    pub async fn raised(&self) {
        while !self.is_raised() {
            self.notify.notified().await;
        }
    }
}

/// Raises `interrupt` on every Ctrl-C for as long as the command runs.
pub fn spawn_listener(interrupt: Arc<Interrupt>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received");
            interrupt.raise();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn raise_without_waiter_is_not_lost() {
        let interrupt = Interrupt::default();
        interrupt.raise();

        assert!(interrupt.is_raised());
        tokio::time::timeout(Duration::from_millis(100), interrupt.raised())
            .await
            .expect("an earlier raise should complete the wait");
        // Still raised for every later wait.
        tokio::time::timeout(Duration::from_millis(100), interrupt.raised())
            .await
            .expect("raise is sticky");
    }

    #[tokio::test]
    async fn waiter_wakes_on_raise() {
        let interrupt = Arc::new(Interrupt::default());
        let raiser = Arc::clone(&interrupt);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            raiser.raise();
        });

        tokio::time::timeout(Duration::from_secs(2), interrupt.raised())
            .await
            .expect("waiter should wake");
        assert!(interrupt.flag().load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn not_raised_keeps_waiting() {
        let interrupt = Interrupt::default();
        let waited = tokio::time::timeout(Duration::from_millis(30), interrupt.raised()).await;
        assert!(waited.is_err());
        assert!(!interrupt.is_raised());
    }
}
