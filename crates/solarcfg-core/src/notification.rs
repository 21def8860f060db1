//! Single-slot notification with token-based expiry.
//!
//! Every [`show`](NotificationTimer::show) mints a fresh token. A scheduled
//! expiry carries the token it was minted for, so a stale timer firing
//! after a newer notification is a no-op. Success notifications expire
//! after the TTL; errors stay until replaced or dismissed.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Auto-dismiss delay for success notifications
pub const DEFAULT_TTL: Duration = Duration::from_secs(4);

/// Time source for expiry deadlines
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock advanced by hand, for tests and simulations
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.lock().map(|now| *now).unwrap_or_else(|p| *p.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NotificationToken(u64);

impl NotificationToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub token: NotificationToken,
    /// `None` for notifications that persist until replaced
    #[serde(skip)]
    pub expires_at: Option<Instant>,
}

/// Expiry to schedule for a freshly shown notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryTicket {
    pub token: NotificationToken,
    pub deadline: Instant,
    /// Delay from now until `deadline`
    pub after: Duration,
}

#[derive(Debug)]
pub struct NotificationTimer<C: Clock = SystemClock> {
    clock: C,
    ttl: Duration,
    next_token: u64,
    live: Option<Notification>,
}

impl Default for NotificationTimer<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> NotificationTimer<C> {
    pub fn new(clock: C) -> Self {
        Self::with_ttl(clock, DEFAULT_TTL)
    }

    pub fn with_ttl(clock: C, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            next_token: 0,
            live: None,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn live(&self) -> Option<&Notification> {
        self.live.as_ref()
    }

    /// Replace the live notification.
    ///
    /// Any previously scheduled expiry becomes stale. Returns the expiry to
    /// schedule for a success; errors get none, which also cancels a pending
    /// success timer outright.
    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>) -> Option<ExpiryTicket> {
        let token = self.mint();
        let now = self.clock.now();
        let expires_at = match kind {
            NotificationKind::Success => Some(now + self.ttl),
            NotificationKind::Error => None,
        };
        self.live = Some(Notification {
            kind,
            message: message.into(),
            token,
            expires_at,
        });
        expires_at.map(|deadline| ExpiryTicket {
            token,
            deadline,
            after: self.ttl,
        })
    }

    /// Clear the live notification if `token` still identifies it.
    ///
    /// Returns whether anything was cleared.
    pub fn expire(&mut self, token: NotificationToken) -> bool {
        let matches = self
            .live
            .as_ref()
            .is_some_and(|n| n.token == token && n.expires_at.is_some());
        if matches {
            self.live = None;
        }
        matches
    }

    /// Clear the live notification if its deadline has passed
    pub fn poll(&mut self) -> Option<NotificationToken> {
        let now = self.clock.now();
        let due = self
            .live
            .as_ref()
            .filter(|n| n.expires_at.is_some_and(|at| at <= now))
            .map(|n| n.token)?;
        self.live = None;
        Some(due)
    }

    /// Clear a live error notification (the operator started a new action)
    pub fn dismiss_error(&mut self) -> bool {
        if self
            .live
            .as_ref()
            .is_some_and(|n| n.kind == NotificationKind::Error)
        {
            self.live = None;
            return true;
        }
        false
    }

    /// Drop the live notification and invalidate every outstanding token
    pub fn cancel(&mut self) {
        self.live = None;
        self.mint();
    }

    fn mint(&mut self) -> NotificationToken {
        self.next_token += 1;
        NotificationToken(self.next_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> (ManualClock, NotificationTimer<ManualClock>) {
        let clock = ManualClock::new();
        (clock.clone(), NotificationTimer::new(clock))
    }

    #[test]
    fn test_success_expires_after_ttl() {
        let (clock, mut timer) = timer();
        let ticket = timer.show(NotificationKind::Success, "saved").unwrap();
        assert_eq!(ticket.after, DEFAULT_TTL);

        clock.advance(Duration::from_millis(3999));
        assert_eq!(timer.poll(), None);
        clock.advance(Duration::from_millis(1));
        assert_eq!(timer.poll(), Some(ticket.token));
        assert!(timer.live().is_none());
    }

    #[test]
    fn test_stale_token_never_clears_newer_notification() {
        let (_clock, mut timer) = timer();
        let first = timer.show(NotificationKind::Success, "one").unwrap();
        let second = timer.show(NotificationKind::Success, "two").unwrap();

        assert!(!timer.expire(first.token));
        assert_eq!(timer.live().map(|n| n.message.as_str()), Some("two"));
        assert!(timer.expire(second.token));
    }

    #[test]
    fn test_error_cancels_pending_success_and_persists() {
        let (clock, mut timer) = timer();
        let success = timer.show(NotificationKind::Success, "saved").unwrap();
        assert!(timer.show(NotificationKind::Error, "failed").is_none());

        assert!(!timer.expire(success.token));
        clock.advance(Duration::from_secs(60));
        assert_eq!(timer.poll(), None);
        assert_eq!(timer.live().map(|n| n.kind), Some(NotificationKind::Error));
    }

    #[test]
    fn test_error_token_cannot_expire() {
        let (_clock, mut timer) = timer();
        timer.show(NotificationKind::Error, "failed");
        let token = timer.live().unwrap().token;
        assert!(!timer.expire(token));
        assert!(timer.dismiss_error());
        assert!(timer.live().is_none());
    }

    #[test]
    fn test_cancel_invalidates_outstanding_tokens() {
        let (_clock, mut timer) = timer();
        let ticket = timer.show(NotificationKind::Success, "saved").unwrap();
        timer.cancel();
        assert!(timer.live().is_none());
        assert!(!timer.expire(ticket.token));
    }

    #[test]
    fn test_dismiss_error_keeps_success() {
        let (_clock, mut timer) = timer();
        timer.show(NotificationKind::Success, "saved");
        assert!(!timer.dismiss_error());
        assert!(timer.live().is_some());
    }
}
