//! In-memory configuration source.

use super::{ChangeCallback, ChangeNotifier, ConfigurationSource, WatchHandle};
use crate::core::SectionKey;
use crate::error::Result;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

/// In-memory configuration source.
///
/// Holds raw values keyed by exact section name. Every mutation fires the change
/// notification synchronously on the calling thread, which makes this source a
/// good fit for tests and for programmatic configuration.
///
/// # Examples
///
/// ```rust
/// use live_config::sources::MemorySource;
///
/// let source = MemorySource::new();
/// source.set("port", 8080i64);
/// ```
pub struct MemorySource {
    name: String,
    values: RwLock<HashMap<String, config::Value>>,
    notifier: ChangeNotifier,
}

impl MemorySource {
    /// Create an empty in-memory source.
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Create an empty in-memory source with a custom name for logging.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(HashMap::new()),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Store a raw value under `section` and notify watchers.
    pub fn set(&self, section: impl Into<SectionKey>, value: impl Into<config::Value>) {
        let section = section.into();
        self.values
            .write()
            .insert(section.as_str().to_string(), value.into());
        self.notifier.notify();
    }

    /// Serialize `value` and store it under `section`, then notify watchers.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as configuration data.
    pub fn set_serialized<S: Serialize>(
        &self,
        section: impl Into<SectionKey>,
        value: &S,
    ) -> Result<()> {
        let raw = config::Config::try_from(value)?.try_deserialize::<config::Value>()?;
        self.set(section, raw);
        Ok(())
    }

    /// Remove the data under `section` and notify watchers.
    pub fn remove(&self, section: impl Into<SectionKey>) {
        let section = section.into();
        self.values.write().remove(section.as_str());
        self.notifier.notify();
    }

    /// Notify watchers without changing any data.
    pub fn touch(&self) {
        self.notifier.notify();
    }

    /// Get the number of registered change callbacks.
    pub fn watcher_count(&self) -> usize {
        self.notifier.callback_count()
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationSource for MemorySource {
    fn get(&self, section: &SectionKey) -> Result<Option<config::Value>> {
        Ok(self.values.read().get(section.as_str()).cloned())
    }

    fn on_change(&self, callback: ChangeCallback) -> Result<WatchHandle> {
        Ok(self.notifier.register(callback))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
