//! Configuration source trait and watch handles.

use crate::core::SectionKey;
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Callback invoked whenever a source's backing data may have changed.
///
/// Sources may invoke it repeatedly and from any thread.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Trait for configuration sources a [`LiveConfigCell`](crate::core::LiveConfigCell) binds to.
///
/// A source supplies raw data per section and a repeating change notification.
/// Implement this trait to plug in other backends (remote APIs, databases,
/// key-value stores).
///
/// # Examples
///
/// ```rust
/// use live_config::core::SectionKey;
/// use live_config::error::Result;
/// use live_config::sources::{ChangeCallback, ChangeNotifier, ConfigurationSource, WatchHandle};
///
/// struct Fixed {
///     notifier: ChangeNotifier,
/// }
///
/// impl ConfigurationSource for Fixed {
///     fn get(&self, _section: &SectionKey) -> Result<Option<config::Value>> {
///         Ok(Some(config::Value::from(42i64)))
///     }
///
///     fn on_change(&self, callback: ChangeCallback) -> Result<WatchHandle> {
///         Ok(self.notifier.register(callback))
///     }
///
///     fn name(&self) -> String {
///         "fixed".to_string()
///     }
/// }
/// ```
pub trait ConfigurationSource: Send + Sync {
    /// Get the raw data stored under `section`.
    ///
    /// Returns `Ok(None)` when the section does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn get(&self, section: &SectionKey) -> Result<Option<config::Value>>;

    /// Register a callback that fires whenever the backing data may have changed.
    ///
    /// The returned handle unregisters the callback when released or dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration cannot be made.
    fn on_change(&self, callback: ChangeCallback) -> Result<WatchHandle>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;
}

/// An open registration on a source's change notifications.
///
/// Releasing the handle, explicitly or by dropping it, unregisters the callback.
/// Releasing more than once has no effect.
#[must_use = "dropping a WatchHandle unregisters the change callback"]
pub struct WatchHandle {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    /// Create a handle that runs `release` once when released.
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle for sources that never change.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Unregister the callback.
    pub fn release(mut self) {
        self.release_inner();
    }

    /// Whether the handle is still registered.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    fn release_inner(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.is_active())
            .finish()
    }
}
