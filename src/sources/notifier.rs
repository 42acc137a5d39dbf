//! Callback registry backing a source's change notifications.

use super::{ChangeCallback, WatchHandle};
use parking_lot::Mutex;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

/// Internal notifier state.
struct NotifierInner {
    callbacks: Vec<(u64, ChangeCallback)>,
    next_id: u64,
}

/// Registry of repeating change callbacks.
///
/// Sources embed one of these and hand out [`WatchHandle`]s from
/// [`ChangeNotifier::register`]. Callbacks are invoked outside the internal lock,
/// so a callback may register or release other callbacks, or trigger another
/// notification, without deadlocking.
///
/// # Examples
///
/// ```rust
/// use live_config::sources::ChangeNotifier;
/// use std::sync::Arc;
///
/// let notifier = ChangeNotifier::new();
/// let handle = notifier.register(Arc::new(|| println!("changed")));
///
/// notifier.notify();
///
/// // Unregister
/// handle.release();
/// assert_eq!(notifier.callback_count(), 0);
/// ```
pub struct ChangeNotifier {
    inner: Arc<Mutex<NotifierInner>>,
}

impl ChangeNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(NotifierInner {
                callbacks: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a callback and return the handle that unregisters it.
    pub fn register(&self, callback: ChangeCallback) -> WatchHandle {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.callbacks.push((id, callback));
            id
        };

        let registry: Weak<Mutex<NotifierInner>> = Arc::downgrade(&self.inner);
        WatchHandle::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().callbacks.retain(|(cb_id, _)| *cb_id != id);
                tracing::debug!(callback = id, "change callback released");
            }
        })
    }

    /// Invoke every registered callback in registration order.
    ///
    /// A panicking callback is logged and does not prevent later callbacks from running.
    pub fn notify(&self) {
        let callbacks: Vec<(u64, ChangeCallback)> = self.inner.lock().callbacks.clone();
        for (id, callback) in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                tracing::error!(callback = id, "change callback panicked");
            }
        }
    }

    /// Get the number of registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.inner.lock().callbacks.len()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
