//! Watchdog token dispatch

use std::sync::{Arc, Mutex, PoisonError};

use crate::listener::{CallbackFilter, SerialListener, TokenMatcher};
use crate::protocol::WATCHDOG_TOKEN;

/// Called with no arguments when the controller's watchdog fires
pub type WatchdogCallback = Arc<dyn Fn() + Send + Sync>;

/// Holds the user callback; outlives individual connections so the callback
/// can be registered before `connect`.
#[derive(Default)]
pub(super) struct WatchdogMonitor {
    callback: Arc<Mutex<Option<WatchdogCallback>>>,
}

impl WatchdogMonitor {
    pub(super) fn set(&self, callback: WatchdogCallback) {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    pub(super) fn clear(&self) {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub(super) fn subscribe(&self, listener: &SerialListener) -> CallbackFilter {
        let slot = self.callback.clone();
        listener.callback_filter(TokenMatcher::exactly(WATCHDOG_TOKEN), move |_| {
            let callback = slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            match callback {
                Some(callback) => callback(),
                None => tracing::debug!("watchdog token with no callback registered"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_callback_replaced_and_cleared() {
        let listener = SerialListener::new();
        let monitor = WatchdogMonitor::default();
        let _filter = monitor.subscribe(&listener);

        // No callback yet: no-op
        listener.dispatch_for_test("W");

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        monitor.set(Arc::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        listener.dispatch_for_test("W");
        listener.dispatch_for_test("WW");
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        monitor.clear();
        listener.dispatch_for_test("W");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
