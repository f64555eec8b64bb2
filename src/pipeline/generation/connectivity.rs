//! Connectivity monitor: reachability reported by health checks plus a user
//! force-offline override.
//!
//! Setters return true exactly when the effective state went from offline
//! to online, which is the cue to drain the offline queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::traits::Connectivity;

pub struct ConnectivityMonitor {
    reachable: AtomicBool,
    force_offline: AtomicBool,
    /// Serializes transitions so each one is reported once.
    transition: Mutex<()>,
}

impl ConnectivityMonitor {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: AtomicBool::new(reachable),
            force_offline: AtomicBool::new(false),
            transition: Mutex::new(()),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    pub fn is_forced_offline(&self) -> bool {
        self.force_offline.load(Ordering::SeqCst)
    }

    /// Record the result of a reachability check.
    pub fn set_reachable(&self, reachable: bool) -> bool {
        self.transition_with(|| self.reachable.store(reachable, Ordering::SeqCst))
    }

    /// Toggle the user override.
    pub fn set_force_offline(&self, forced: bool) -> bool {
        self.transition_with(|| self.force_offline.store(forced, Ordering::SeqCst))
    }

    fn transition_with(&self, apply: impl FnOnce()) -> bool {
        let _lock = self.transition.lock();
        let was_online = self.is_effectively_online();
        apply();
        let came_online = !was_online && self.is_effectively_online();
        if came_online {
            tracing::info!("Connectivity restored");
        } else if was_online && !self.is_effectively_online() {
            tracing::info!(
                forced = self.is_forced_offline(),
                "Switched to offline mode"
            );
        }
        came_online
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for ConnectivityMonitor {
    fn is_effectively_online(&self) -> bool {
        self.is_reachable() && !self.is_forced_offline()
    }
}
