//! Subscription handles.

use std::fmt;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

/// Something a subscription can be removed from.
pub(crate) trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);
}

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// Dropping the handle or calling [`Subscription::unsubscribe`] removes exactly
/// this subscription. Once that returns, the observer receives no further calls
/// from the cell. Unsubscribing twice is a no-op.
#[must_use = "dropping a Subscription unsubscribes the observer"]
pub struct Subscription {
    id: u64,
    owner: Weak<dyn Unsubscribe>,
    closed: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: u64, owner: Weak<dyn Unsubscribe>) -> Self {
        Self {
            id,
            owner,
            closed: AtomicBool::new(false),
        }
    }

    /// Identifier of this subscription within its cell.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether this handle was already unsubscribed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Remove the subscription.
    pub fn unsubscribe(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(owner) = self.owner.upgrade() {
            owner.unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        removed: Mutex<Vec<u64>>,
    }

    impl Unsubscribe for Recorder {
        fn unsubscribe(&self, id: u64) {
            self.removed.lock().push(id);
        }
    }

    #[test]
    fn test_unsubscribe_once() {
        let recorder = Arc::new(Recorder::default());
        let owner: Arc<dyn Unsubscribe> = recorder.clone();
        let subscription = Subscription::new(3, Arc::downgrade(&owner));

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(subscription.is_closed());
        drop(subscription);

        assert_eq!(*recorder.removed.lock(), vec![3]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let recorder = Arc::new(Recorder::default());
        let owner: Arc<dyn Unsubscribe> = recorder.clone();
        drop(Subscription::new(1, Arc::downgrade(&owner)));
        assert_eq!(*recorder.removed.lock(), vec![1]);
    }

    #[test]
    fn test_owner_gone() {
        let owner: Arc<dyn Unsubscribe> = Arc::new(Recorder::default());
        let subscription = Subscription::new(1, Arc::downgrade(&owner));
        drop(owner);
        subscription.unsubscribe();
        assert!(subscription.is_closed());
    }
}
