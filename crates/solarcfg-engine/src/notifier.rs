//! Runtime driver for the notification timer.
//!
//! Each success notification gets a spawned expiry task that sleeps until
//! its deadline and then expires the token it was scheduled for. Showing a
//! newer notification aborts the task; a task that fires anyway finds its
//! token stale and does nothing.

use solarcfg_core::notification::{Clock, NotificationTimer};
use solarcfg_core::{Notification, NotificationKind};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Clock following tokio's (possibly paused) time
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

type SharedTimer = Arc<Mutex<NotificationTimer<TokioClock>>>;

#[derive(Debug)]
pub struct Notifier {
    timer: SharedTimer,
    expiry: Mutex<Option<JoinHandle<()>>>,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            timer: Arc::new(Mutex::new(NotificationTimer::with_ttl(TokioClock, ttl))),
            expiry: Mutex::new(None),
        }
    }

    /// Show `message`, replacing whatever is live.
    ///
    /// Must be called from within a tokio runtime when `kind` is
    /// `Success`, since the expiry task is spawned on it.
    pub fn show(&self, kind: NotificationKind, message: impl Into<String>) {
        let message = message.into();
        // held until the new handle is stored so the live token's task is never the one aborted
        let mut expiry = lock(&self.expiry);
        let ticket = lock(&self.timer).show(kind, message.clone());
        tracing::debug!(kind = ?kind, message = %message, "notification shown");

        let handle = ticket.map(|ticket| {
            let timer = Arc::clone(&self.timer);
            tokio::spawn(async move {
                tokio::time::sleep(ticket.after).await;
                if lock(&timer).expire(ticket.token) {
                    tracing::debug!(token = ticket.token.value(), "notification expired");
                }
            })
        });
        if let Some(previous) = std::mem::replace(&mut *expiry, handle) {
            previous.abort();
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(NotificationKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(NotificationKind::Error, message);
    }

    pub fn live(&self) -> Option<Notification> {
        lock(&self.timer).live().cloned()
    }

    /// Clear a persisting error before a new action starts
    pub fn dismiss_error(&self) {
        lock(&self.timer).dismiss_error();
    }

    /// Drop the live notification and its pending expiry
    pub fn cancel(&self) {
        if let Some(handle) = lock(&self.expiry).take() {
            handle.abort();
        }
        lock(&self.timer).cancel();
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.expiry).take() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_successes_leave_nothing_live() {
        let notifier = Arc::new(Notifier::new(Duration::from_millis(50)));

        let shows: Vec<_> = (0..32)
            .map(|i| {
                let notifier = Arc::clone(&notifier);
                tokio::spawn(async move { notifier.success(format!("saved {}", i)) })
            })
            .collect();
        for show in shows {
            show.await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(notifier.live().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_is_not_expired() {
        let notifier = Notifier::new(Duration::from_secs(4));
        notifier.success("saved");
        notifier.error("failed");

        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(notifier.live().unwrap().kind, NotificationKind::Error);
    }
}
