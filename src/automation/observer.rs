//! Status and countdown notifications.
//!
//! Observers register through [`Observers::subscribe`] and stay registered for as
//! long as the returned [`Subscription`] lives. Notifications are delivered
//! synchronously from the sequencer, in the order the transitions happen.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::info;

/// User-visible status of the automation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    Starting,
    LaunchingTarget,
    Running,
    Paused,
    Stopped,
    TargetNotFound,
    LaunchFailed,
    Interrupted,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ready => "ready",
            Self::Starting => "starting…",
            Self::LaunchingTarget => "launching target app…",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::TargetNotFound => "target app not found",
            Self::LaunchFailed => "failed to launch target app",
            Self::Interrupted => "interrupted",
        })
    }
}

/// Receiver of automation notifications.
pub trait AutomationObserver: Send + Sync {
    /// A user-visible state or status transition happened.
    fn on_status_changed(&self, status: Status);

    /// The countdown changed; `text` is `Remaining: MM:SS`.
    fn on_time_remaining_changed(&self, text: &str);
}

/// Observer that writes every notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl AutomationObserver for LogObserver {
    fn on_status_changed(&self, status: Status) {
        info!(target: "autoswipe::status", %status, "Status changed");
    }

    fn on_time_remaining_changed(&self, text: &str) {
        info!(target: "autoswipe::status", "{text}");
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: BTreeMap<u64, Arc<dyn AutomationObserver>>,
}

/// Shared set of registered observers.
#[derive(Clone, Default)]
pub struct Observers {
    registry: Arc<Mutex<Registry>>,
}

impl Observers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer` until the returned subscription is dropped.
    #[must_use = "dropping the subscription unregisters the observer"]
    pub fn subscribe(&self, observer: Arc<dyn AutomationObserver>) -> Subscription {
        let mut registry = self.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.insert(id, observer);
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registration (controller teardown).
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub(crate) fn status(&self, status: Status) {
        for observer in self.snapshot() {
            observer.on_status_changed(status);
        }
    }

    pub(crate) fn time_remaining(&self, text: &str) {
        for observer in self.snapshot() {
            observer.on_time_remaining_changed(text);
        }
    }

    // Callbacks run without the lock held so they may subscribe or unsubscribe.
    fn snapshot(&self) -> Vec<Arc<dyn AutomationObserver>> {
        self.lock().entries.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("len", &self.len()).finish()
    }
}

/// Keeps an observer registered; unregisters it on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .remove(&self.id);
        }
    }
}
