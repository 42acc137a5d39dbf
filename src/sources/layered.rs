//! Layered file/environment configuration source.

use super::loader::ConfigLoader;
use super::{
    ChangeCallback, ChangeNotifier, ConfigLayer, ConfigurationSource, EnvLayer, FileLayer,
    LayerTable, WatchHandle,
};
use crate::core::SectionKey;
use crate::error::Result;
use arc_swap::ArcSwap;
use config::{Value, ValueKind};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "file-watch")]
use crate::notify::{ConfigWatcher, DEFAULT_DEBOUNCE};

/// Configuration source merging files, environment variables and custom layers.
///
/// The merged tree is kept as an immutable snapshot. [`LayeredSource::reload`]
/// rebuilds it from every layer; if that succeeds the snapshot is swapped and
/// every change callback fires, otherwise the previous snapshot stays in place.
/// With file watching enabled, reloads happen automatically when a file changes.
///
/// Section lookups follow `.`/`:` separated paths and fall back to a
/// case-insensitive match when no key matches exactly.
///
/// # Examples
///
/// ```rust,no_run
/// use live_config::prelude::*;
/// use live_config::sources::LayeredSource;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, Clone)]
/// struct ServerConfig {
///     port: u16,
/// }
///
/// # async fn example() -> Result<()> {
/// let source = LayeredSource::builder()
///     .with_file("config/default.yaml")
///     .with_file("config/production.yaml")
///     .with_env_overrides("APP", "__")
///     .with_file_watch(true)
///     .build()
///     .await?;
///
/// let server = LiveConfigCell::<ServerConfig>::new("server", source, None)?;
/// println!("port: {}", server.get_value()?.port);
/// # Ok(())
/// # }
/// ```
pub struct LayeredSource {
    loader: ConfigLoader,
    snapshot: ArcSwap<LayerTable>,
    /// Held from layer collection until the snapshot is stored.
    reload_lock: Mutex<()>,
    notifier: ChangeNotifier,
    #[cfg(feature = "file-watch")]
    watcher: Mutex<Option<ConfigWatcher>>,
}

impl LayeredSource {
    /// Create a new builder.
    pub fn builder() -> LayeredSourceBuilder {
        LayeredSourceBuilder::new()
    }

    /// Create a source from already-assembled layers and load it once.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load fails.
    pub fn from_loader(loader: ConfigLoader) -> Result<Self> {
        let root = loader.load()?;
        Ok(Self {
            loader,
            snapshot: ArcSwap::from_pointee(root),
            reload_lock: Mutex::new(()),
            notifier: ChangeNotifier::new(),
            #[cfg(feature = "file-watch")]
            watcher: Mutex::new(None),
        })
    }

    /// Rebuild the merged tree from every layer and notify watchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any layer fails to load. The previous tree is kept and
    /// no callback fires in that case.
    ///
    /// Concurrent reloads load one at a time, so the stored tree always comes
    /// from the most recent load. Callbacks run after the lock is released.
    pub fn reload(&self) -> Result<()> {
        {
            let _reload = self.reload_lock.lock();
            let root = self.loader.load()?;
            self.snapshot.store(Arc::new(root));
        }
        tracing::debug!(layers = ?self.loader.layer_names(), "configuration layers reloaded");
        self.notifier.notify();
        Ok(())
    }

    /// Get the layer names in priority order.
    pub fn layer_names(&self) -> Vec<String> {
        self.loader.layer_names()
    }

    /// Whether files are being watched for changes.
    #[cfg(feature = "file-watch")]
    pub fn is_watching(&self) -> bool {
        self.watcher.lock().is_some()
    }

    /// Get the files being watched for changes.
    #[cfg(feature = "file-watch")]
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.watcher
            .lock()
            .as_ref()
            .map(ConfigWatcher::watched_paths)
            .unwrap_or_default()
    }
}

impl ConfigurationSource for LayeredSource {
    fn get(&self, section: &SectionKey) -> Result<Option<Value>> {
        let root = self.snapshot.load();
        Ok(lookup(&root, section))
    }

    fn on_change(&self, callback: ChangeCallback) -> Result<WatchHandle> {
        Ok(self.notifier.register(callback))
    }

    fn name(&self) -> String {
        format!("layered[{}]", self.loader.layer_names().join(", "))
    }
}

/// Walk `section` through the merged tree.
fn lookup(root: &LayerTable, section: &SectionKey) -> Option<Value> {
    if section.is_root() {
        return Some(Value::from(root.clone()));
    }

    let mut segments = section.segments();
    let mut current = find(root, segments.next()?)?;
    for segment in segments {
        match &current.kind {
            ValueKind::Table(table) => current = find(table, segment)?,
            _ => return None,
        }
    }
    Some(current.clone())
}

fn find<'a>(table: &'a LayerTable, key: &str) -> Option<&'a Value> {
    table.get(key).or_else(|| {
        table
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}

/// Builder for constructing a [`LayeredSource`].
///
/// Files are layered in the order they are added, later files overriding
/// earlier ones. Environment overrides sit above every file.
pub struct LayeredSourceBuilder {
    file_paths: Vec<(PathBuf, bool)>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
    custom_layers: Vec<Box<dyn ConfigLayer>>,
    file_watch: bool,
    debounce: Option<Duration>,
}

impl LayeredSourceBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            file_paths: Vec::new(),
            env_prefix: None,
            env_separator: None,
            custom_layers: Vec::new(),
            file_watch: false,
            debounce: None,
        }
    }

    /// Add a required file layer.
    ///
    /// Supported formats: YAML (.yaml, .yml), TOML (.toml), JSON (.json)
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push((path.into(), true));
        self
    }

    /// Add a file layer that is skipped while the file does not exist.
    pub fn with_optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push((path.into(), false));
        self
    }

    /// Add environment variable overrides.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "APP")
    /// * `separator` - Separator for nested keys (e.g., "__" for APP_DB__HOST)
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Add a custom layer.
    pub fn with_layer<L: ConfigLayer + 'static>(mut self, layer: L) -> Self {
        self.custom_layers.push(Box::new(layer));
        self
    }

    /// Reload automatically when any file layer changes.
    pub fn with_file_watch(mut self, enabled: bool) -> Self {
        self.file_watch = enabled;
        self
    }

    /// Quiet period before a burst of file changes triggers a reload.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = Some(debounce);
        self
    }

    /// Build the source and perform the initial load.
    ///
    /// With file watching enabled this must run inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No layers were configured
    /// - A layer fails to load
    /// - File watching was requested but cannot be set up
    pub async fn build(self) -> Result<Arc<LayeredSource>> {
        let mut loader = ConfigLoader::new();

        for (index, (path, required)) in self.file_paths.iter().enumerate() {
            let mut layer = FileLayer::new(path).with_priority(file_priority(index));
            if !required {
                layer = layer.optional();
            }
            loader.add_layer(Box::new(layer));
        }

        for layer in self.custom_layers {
            loader.add_layer(layer);
        }

        if let (Some(prefix), Some(separator)) = (self.env_prefix, self.env_separator) {
            let env = EnvLayer::new(prefix, separator);
            let above_files = file_priority(self.file_paths.len());
            let priority = env.priority().max(above_files);
            loader.add_layer(Box::new(env.with_priority(priority)));
        }

        let source = Arc::new(LayeredSource::from_loader(loader)?);

        if self.file_watch {
            #[cfg(feature = "file-watch")]
            {
                let paths: Vec<PathBuf> = self.file_paths.into_iter().map(|(p, _)| p).collect();
                spawn_file_watch(&source, &paths, self.debounce.unwrap_or(DEFAULT_DEBOUNCE))?;
            }
            #[cfg(not(feature = "file-watch"))]
            return Err(crate::error::ConfigError::WatchError(
                "file watching requires the `file-watch` feature".to_string(),
            ));
        }

        Ok(source)
    }
}

/// Priority of the file added at `index`; later files win.
fn file_priority(index: usize) -> i32 {
    i32::try_from(index)
        .ok()
        .and_then(|index| index.checked_mul(10))
        .and_then(|offset| offset.checked_add(100))
        .unwrap_or(i32::MAX)
}

impl Default for LayeredSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "file-watch")]
fn spawn_file_watch(
    source: &Arc<LayeredSource>,
    paths: &[PathBuf],
    debounce: Duration,
) -> Result<()> {
    let (watcher, mut rx) = ConfigWatcher::new(debounce)?;
    for path in paths {
        watcher.watch(path)?;
    }

    let weak = Arc::downgrade(source);
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            let Some(source) = weak.upgrade() else {
                break;
            };
            if let Err(e) = source.reload() {
                tracing::error!(error = %e, "Failed to reload configuration files");
            }
        }
    });

    *source.watcher.lock() = Some(watcher);
    Ok(())
}
