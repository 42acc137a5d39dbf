//! The live configuration cell.

use crate::core::subscription::Unsubscribe;
use crate::core::{FnObserver, LiveConfigCellBuilder, Observer, SectionKey, Subscription};
use crate::error::{ConfigError, Result, ValidationError};
use crate::sources::{ConfigurationSource, WatchHandle};
use arc_swap::ArcSwapOption;
use parking_lot::{Mutex, ReentrantMutex};
use serde::de::DeserializeOwned;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

#[cfg(feature = "metrics")]
use crate::metrics::ConfigMetrics;

/// Type alias for validator functions.
pub(crate) type Validator<T> =
    Arc<dyn Fn(&T) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Counters describing the reload history of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadStats {
    /// Reload signals that were processed
    pub attempts: u64,
    /// Reloads that replaced the stored value
    pub successes: u64,
    /// Reloads that kept the last-known-good value
    pub failures: u64,
}

#[derive(Default)]
struct ReloadCounters {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

struct SubscriberEntry<T> {
    id: u64,
    observer: Arc<dyn Observer<T>>,
    active: AtomicBool,
}

struct CellState<T> {
    subscribers: Vec<Arc<SubscriberEntry<T>>>,
    next_id: u64,
    watch: Option<WatchHandle>,
    reloading: bool,
    pending: bool,
}

struct CellInner<T> {
    section: SectionKey,
    source: Arc<dyn ConfigurationSource>,
    current: ArcSwapOption<T>,
    validator: Option<Validator<T>>,
    /// Serializes delivery passes: reload fan-out, replay and completion.
    delivery: ReentrantMutex<()>,
    state: Mutex<CellState<T>>,
    disposed: AtomicBool,
    counters: ReloadCounters,
    #[cfg(feature = "metrics")]
    metrics: Option<ConfigMetrics>,
}

/// A live, reactively updated holder of one configuration object.
///
/// The cell is bound to a section of a [`ConfigurationSource`]. It parses the
/// section once at construction, then again every time the source signals a
/// change. Successful parses replace the stored value and are pushed to every
/// subscriber in subscription order; failed parses are logged and leave the
/// last-known-good value in place.
///
/// Reads are lock-free. Cloning the cell is cheap and every clone shares state.
///
/// # Examples
///
/// ```rust
/// use live_config::prelude::*;
/// use live_config::sources::MemorySource;
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// struct Feature {
///     enabled: bool,
/// }
///
/// # fn main() -> live_config::error::Result<()> {
/// let source = Arc::new(MemorySource::new());
/// let cell = LiveConfigCell::new("Feature", source.clone(), Some(Feature { enabled: false }))?;
/// assert!(!cell.get_value()?.enabled);
///
/// let _subscription = cell.subscribe_fn(|feature: Arc<Feature>| {
///     println!("feature enabled: {}", feature.enabled);
/// })?;
///
/// source.set_serialized("Feature", &Feature { enabled: true })?;
/// assert!(cell.get_value()?.enabled);
/// # Ok(())
/// # }
/// ```
pub struct LiveConfigCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> LiveConfigCell<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Create a cell bound to `section`, falling back to `default` when the
    /// section has no usable data yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the change watch cannot be registered on the source.
    pub fn new(
        section: impl Into<SectionKey>,
        source: Arc<dyn ConfigurationSource>,
        default: Option<T>,
    ) -> Result<Self> {
        let mut builder = Self::builder(section);
        if let Some(default) = default {
            builder = builder.with_default(default);
        }
        builder.build(source)
    }

    /// Create a builder for a cell bound to `section`.
    pub fn builder(section: impl Into<SectionKey>) -> LiveConfigCellBuilder<T> {
        LiveConfigCellBuilder::new(section)
    }

    pub(crate) fn create(
        section: SectionKey,
        source: Arc<dyn ConfigurationSource>,
        default: Option<T>,
        validator: Option<Validator<T>>,
        #[cfg(feature = "metrics")] metrics: Option<ConfigMetrics>,
    ) -> Result<Self> {
        let inner = Arc::new(CellInner {
            section,
            source,
            current: ArcSwapOption::empty(),
            validator,
            delivery: ReentrantMutex::new(()),
            state: Mutex::new(CellState {
                subscribers: Vec::new(),
                next_id: 0,
                watch: None,
                reloading: false,
                pending: false,
            }),
            disposed: AtomicBool::new(false),
            counters: ReloadCounters::default(),
            #[cfg(feature = "metrics")]
            metrics,
        });

        let initial = match inner.read() {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                tracing::debug!(
                    section = %inner.section,
                    source = %inner.source.name(),
                    "no configuration data, using default"
                );
                default
            }
            Err(e) => {
                tracing::warn!(
                    section = %inner.section,
                    error = %e,
                    "Failed to parse initial configuration, using default"
                );
                default
            }
        };
        inner.current.store(initial.map(Arc::new));

        let weak: Weak<CellInner<T>> = Arc::downgrade(&inner);
        let watch = inner.source.on_change(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_reload_signal();
            }
        }))?;
        inner.state.lock().watch = Some(watch);

        Ok(Self { inner })
    }

    /// Get the current configuration value.
    ///
    /// This is a lock-free read returning an `Arc<T>`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] if no value was ever parsed and no
    /// default was supplied, or [`ConfigError::Disposed`] after disposal.
    pub fn get_value(&self) -> Result<Arc<T>> {
        if self.is_disposed() {
            return Err(self.disposed_error());
        }
        self.inner
            .current
            .load_full()
            .ok_or_else(|| ConfigError::NotConfigured {
                section: self.inner.section.to_string(),
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Get the current value, or `None` if there is none.
    pub fn try_get(&self) -> Option<Arc<T>> {
        self.get_value().ok()
    }

    /// Get an owned copy of the current value.
    ///
    /// # Errors
    ///
    /// Same as [`LiveConfigCell::get_value`].
    pub fn get_cloned(&self) -> Result<T>
    where
        T: Clone,
    {
        self.get_value().map(|value| T::clone(&value))
    }

    /// Subscribe an observer to configuration changes.
    ///
    /// If a value is present it is delivered to the observer before this returns.
    /// After that the observer receives every successfully reloaded value, in
    /// subscription order relative to other observers. Dropping the returned
    /// handle unsubscribes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Disposed`] after disposal.
    pub fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Result<Subscription> {
        let inner = &self.inner;
        let _delivery = inner.delivery.lock();

        let (entry, current) = {
            let mut state = inner.state.lock();
            if inner.disposed.load(Ordering::Acquire) {
                return Err(self.disposed_error());
            }
            let id = state.next_id;
            state.next_id += 1;
            let entry = Arc::new(SubscriberEntry {
                id,
                observer,
                active: AtomicBool::new(true),
            });
            state.subscribers.push(Arc::clone(&entry));
            inner.record_subscriber_count(state.subscribers.len());
            (entry, inner.current.load_full())
        };

        tracing::info!(
            section = %inner.section,
            subscriber = entry.id,
            "Added configuration observer"
        );

        if let Some(value) = current {
            inner.deliver(&entry, &value);
        }

        let owner: Weak<dyn Unsubscribe> = Arc::downgrade(&self.inner) as Weak<dyn Unsubscribe>;
        Ok(Subscription::new(entry.id, owner))
    }

    /// Subscribe a closure to configuration changes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Disposed`] after disposal.
    pub fn subscribe_fn<F>(&self, on_next: F) -> Result<Subscription>
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnObserver::new(on_next)))
    }

    /// Subscribe through a channel.
    ///
    /// The receiver yields the replayed value (if any), then every reloaded value,
    /// and closes when the cell is disposed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Disposed`] after disposal.
    #[cfg(feature = "tokio")]
    pub fn subscribe_channel(
        &self,
    ) -> Result<(Subscription, tokio::sync::mpsc::UnboundedReceiver<Arc<T>>)> {
        let (observer, rx) = crate::core::ChannelObserver::new();
        let subscription = self.subscribe(Arc::new(observer))?;
        Ok((subscription, rx))
    }

    /// Re-read and re-parse the bound section.
    ///
    /// Normally invoked by the source's change notification. On success the
    /// stored value is replaced and every subscriber is notified; on failure the
    /// stored value is kept and the failure is logged. Never panics.
    pub fn on_reload_signal(&self) {
        self.inner.on_reload_signal();
    }
}

impl<T> LiveConfigCell<T> {
    /// Complete every subscriber, clear the subscriber set and release the watch.
    ///
    /// Calling this more than once has no further effect.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Whether the cell was disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// The section this cell is bound to.
    pub fn section(&self) -> &SectionKey {
        &self.inner.section
    }

    /// Whether a value is currently stored.
    pub fn has_value(&self) -> bool {
        self.inner.current.load().is_some()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    /// Whether the cell still holds its watch on the source.
    pub fn is_watching(&self) -> bool {
        self.inner
            .state
            .lock()
            .watch
            .as_ref()
            .is_some_and(WatchHandle::is_active)
    }

    /// Snapshot of the reload counters.
    pub fn stats(&self) -> ReloadStats {
        let counters = &self.inner.counters;
        ReloadStats {
            attempts: counters.attempts.load(Ordering::Relaxed),
            successes: counters.successes.load(Ordering::Relaxed),
            failures: counters.failures.load(Ordering::Relaxed),
        }
    }

    fn disposed_error(&self) -> ConfigError {
        ConfigError::Disposed(self.inner.section.to_string())
    }
}

impl<T> Clone for LiveConfigCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for LiveConfigCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveConfigCell")
            .field("section", &self.inner.section)
            .field("type", &std::any::type_name::<T>())
            .field("has_value", &self.has_value())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl<T> CellInner<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Parse the bound section. `Ok(None)` means the section has no data.
    fn read(&self) -> Result<Option<T>> {
        let Some(raw) = self.source.get(&self.section)? else {
            return Ok(None);
        };
        let value: T = raw.try_deserialize()?;

        if let Some(validator) = &self.validator {
            if let Err(e) = validator(&value) {
                #[cfg(feature = "metrics")]
                if let Some(metrics) = &self.metrics {
                    metrics.record_validation_failure();
                }
                return Err(e.into());
            }
        }

        Ok(Some(value))
    }

    fn on_reload_signal(&self) {
        let _delivery = self.delivery.lock();
        {
            let mut state = self.state.lock();
            if self.disposed.load(Ordering::Acquire) {
                return;
            }
            // Re-entered from one of our own observers: run again once the current pass ends.
            if state.reloading {
                state.pending = true;
                return;
            }
            state.reloading = true;
        }

        loop {
            if catch_unwind(AssertUnwindSafe(|| self.reload_once())).is_err() {
                tracing::error!(section = %self.section, "configuration reload panicked");
            }

            let mut state = self.state.lock();
            if state.pending && !self.disposed.load(Ordering::Acquire) {
                state.pending = false;
                continue;
            }
            state.pending = false;
            state.reloading = false;
            break;
        }
    }

    fn reload_once(&self) {
        self.counters.attempts.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        let started = self.metrics.as_ref().map(ConfigMetrics::start_reload);

        let outcome = match self.read() {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err("section has no data".to_string()),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(value) => {
                self.counters.successes.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "metrics")]
                if let (Some(metrics), Some(started)) = (&self.metrics, started) {
                    metrics.record_reload_success(started);
                }
                tracing::info!(section = %self.section, "Updated configuration value");
                self.publish(value);
            }
            Err(reason) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "metrics")]
                if let (Some(metrics), Some(started)) = (&self.metrics, started) {
                    metrics.record_reload_failure(started);
                }
                let error = ConfigError::ReloadParse {
                    section: self.section.to_string(),
                    reason,
                };
                tracing::error!(
                    section = %self.section,
                    source = %self.source.name(),
                    error = %error,
                    "Failed to parse config, keeping last known good value"
                );
            }
        }
    }

    fn publish(&self, value: T) {
        let value = Arc::new(value);
        let subscribers = {
            let state = self.state.lock();
            self.current.store(Some(Arc::clone(&value)));
            state.subscribers.clone()
        };

        for entry in &subscribers {
            self.deliver(entry, &value);
        }
    }
}

impl<T> CellInner<T> {
    fn deliver(&self, entry: &SubscriberEntry<T>, value: &Arc<T>) {
        if !entry.active.load(Ordering::Acquire) {
            return;
        }
        let delivered = catch_unwind(AssertUnwindSafe(|| {
            entry.observer.on_next(Arc::clone(value));
        }));
        if delivered.is_err() {
            tracing::error!(
                section = %self.section,
                subscriber = entry.id,
                "configuration observer panicked in on_next"
            );
        }
    }

    fn dispose(&self) {
        let _delivery = self.delivery.lock();
        let (subscribers, watch) = {
            let mut state = self.state.lock();
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            (std::mem::take(&mut state.subscribers), state.watch.take())
        };

        for entry in &subscribers {
            if !entry.active.swap(false, Ordering::AcqRel) {
                continue;
            }
            let completed = catch_unwind(AssertUnwindSafe(|| entry.observer.on_complete()));
            if completed.is_err() {
                tracing::error!(
                    section = %self.section,
                    subscriber = entry.id,
                    "configuration observer panicked in on_complete"
                );
            }
        }

        if let Some(watch) = watch {
            watch.release();
        }
        self.record_subscriber_count(0);

        tracing::info!(
            section = %self.section,
            observers = subscribers.len(),
            "Disposed configuration cell"
        );
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    fn record_subscriber_count(&self, count: usize) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.update_subscriber_count(count as i64);
        }
    }
}

impl<T> Unsubscribe for CellInner<T>
where
    T: Send + Sync + 'static,
{
    fn unsubscribe(&self, id: u64) {
        let _delivery = self.delivery.lock();
        let removed = {
            let mut state = self.state.lock();
            let removed = state
                .subscribers
                .iter()
                .position(|entry| entry.id == id)
                .map(|index| state.subscribers.remove(index));
            self.record_subscriber_count(state.subscribers.len());
            removed
        };

        if let Some(entry) = removed {
            entry.active.store(false, Ordering::Release);
            tracing::info!(
                section = %self.section,
                subscriber = id,
                "Removed configuration observer"
            );
        }
    }
}

impl<T> Drop for CellInner<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Read access to the current value of a configuration object.
pub trait ConfigAccessor<T>: Send + Sync {
    /// Get the current value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] if no value is available.
    fn value(&self) -> Result<Arc<T>>;
}

/// A stream of configuration values that observers can subscribe to.
pub trait ConfigObservable<T>: Send + Sync {
    /// Subscribe an observer, replaying the current value if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream no longer accepts subscribers.
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Result<Subscription>;
}

impl<T> ConfigAccessor<T> for LiveConfigCell<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn value(&self) -> Result<Arc<T>> {
        self.get_value()
    }
}

impl<T> ConfigObservable<T> for LiveConfigCell<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Result<Subscription> {
        LiveConfigCell::subscribe(self, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemorySource;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        value: i32,
    }

    fn source_with(value: i32) -> Arc<MemorySource> {
        let source = Arc::new(MemorySource::new());
        source
            .set_serialized("test", &TestConfig { value })
            .unwrap();
        source
    }

    #[test]
    fn test_create_and_read() {
        let source = source_with(42);
        let cell = LiveConfigCell::<TestConfig>::new("test", source, None).unwrap();
        assert_eq!(cell.get_value().unwrap().value, 42);
        assert!(cell.is_watching());
    }

    #[test]
    fn test_clone_shares_state() {
        let source = source_with(1);
        let cell = LiveConfigCell::<TestConfig>::new("test", source.clone(), None).unwrap();
        let cell2 = cell.clone();

        source
            .set_serialized("test", &TestConfig { value: 2 })
            .unwrap();
        assert_eq!(cell2.get_value().unwrap().value, 2);

        cell.dispose();
        assert!(cell2.is_disposed());
    }

    #[test]
    fn test_reentrant_reload_is_coalesced() {
        let source = source_with(0);
        let cell = LiveConfigCell::<TestConfig>::new("test", source.clone(), None).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_first = Arc::clone(&seen);
        let source_in_observer = Arc::clone(&source);
        let _first = cell
            .subscribe_fn(move |config: Arc<TestConfig>| {
                seen_first.lock().push(("first", config.value));
                if config.value == 1 {
                    source_in_observer
                        .set_serialized("test", &TestConfig { value: 2 })
                        .unwrap();
                }
            })
            .unwrap();
        let seen_second = Arc::clone(&seen);
        let _second = cell
            .subscribe_fn(move |config: Arc<TestConfig>| {
                seen_second.lock().push(("second", config.value));
            })
            .unwrap();

        source
            .set_serialized("test", &TestConfig { value: 1 })
            .unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                ("first", 0),
                ("second", 0),
                ("first", 1),
                ("second", 1),
                ("first", 2),
                ("second", 2),
            ]
        );
        assert_eq!(cell.get_value().unwrap().value, 2);
    }

    #[test]
    fn test_drop_releases_watch() {
        let source = source_with(1);
        let cell = LiveConfigCell::<TestConfig>::new("test", source.clone(), None).unwrap();
        assert_eq!(source.watcher_count(), 1);
        drop(cell);
        assert_eq!(source.watcher_count(), 0);
    }
}
