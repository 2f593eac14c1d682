use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use super::{Notification, NotificationSeverity, NotificationSink};

/// Holds the notifications currently on screen and expires them after a fixed TTL.
///
/// There is no queue: every notification is shown at once and disappears on its
/// own deadline or when dismissed.
#[derive(Clone)]
pub struct NotificationCenter {
    ttl: Duration,
    active: Arc<Mutex<Vec<Notification>>>,
    forward: Option<Arc<dyn NotificationSink>>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            active: Arc::new(Mutex::new(Vec::new())),
            forward: None,
        }
    }

    /// Also hand every notification to `sink` (e.g. the log) as it is raised.
    pub fn with_forward(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.forward = Some(sink);
        self
    }

    /// Notifications whose deadline has not passed, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }

    pub fn active_at(&self, now: Instant) -> Vec<Notification> {
        let mut guard = self.lock();
        guard.retain(|n| !n.is_expired(now));
        guard.clone()
    }

    /// Remove a notification before its deadline. Returns false if it was already gone.
    pub fn dismiss(&self, id: &str) -> bool {
        let mut guard = self.lock();
        let before = guard.len();
        guard.retain(|n| n.id != id);
        guard.len() != before
    }

    /// Drop everything that has expired; returns how many were removed.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.lock();
        let before = guard.len();
        guard.retain(|n| !n.is_expired(now));
        before - guard.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl NotificationSink for NotificationCenter {
    fn notify(&self, message: &str, severity: NotificationSeverity) {
        if let Some(forward) = &self.forward {
            forward.notify(message, severity);
        }
        self.lock()
            .push(Notification::new(message, severity, self.ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_expire_after_ttl() {
        let center = NotificationCenter::new(Duration::from_millis(5000));
        center.notify("Alarm stopped", NotificationSeverity::Success);

        let now = Instant::now();
        assert_eq!(center.active_at(now).len(), 1);
        assert!(center.active_at(now + Duration::from_millis(5001)).is_empty());
    }

    #[test]
    fn dismiss_removes_only_the_target() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        center.notify("first", NotificationSeverity::Info);
        center.notify("second", NotificationSeverity::Error);

        let first_id = center.active()[0].id.clone();
        assert!(center.dismiss(&first_id));
        assert!(!center.dismiss(&first_id));

        let remaining = center.active();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "second");
        assert_eq!(remaining[0].severity, NotificationSeverity::Error);
    }

    #[test]
    fn zero_ttl_notifications_are_pruned() {
        let center = NotificationCenter::new(Duration::ZERO);
        center.notify("gone", NotificationSeverity::Warning);
        assert_eq!(center.prune(), 1);
        assert!(center.active().is_empty());
    }
}
