//! File watching that drives reload signals.

use crate::error::{ConfigError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Default quiet period before a burst of file events becomes one reload signal.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Configuration watcher that monitors files for changes.
///
/// Uses the `notify` crate to watch the directories containing configuration
/// files, so editors that save by renaming a temporary file over the original
/// are still seen. Events are debounced: a burst of changes produces a single
/// signal once no further event arrived for the debounce duration.
///
/// Must be created from within a tokio runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use live_config::notify::ConfigWatcher;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (watcher, mut rx) = ConfigWatcher::new(Duration::from_millis(500))?;
/// watcher.watch("/path/to/config.yaml")?;
///
/// while let Some(()) = rx.recv().await {
///     println!("Config file changed, reload triggered!");
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConfigWatcher {
    watcher: Mutex<RecommendedWatcher>,
    debounce_duration: Duration,
    files: Arc<Mutex<Vec<PathBuf>>>,
    dirs: Mutex<Vec<PathBuf>>,
}

impl ConfigWatcher {
    /// Create a new configuration watcher.
    ///
    /// Returns the watcher and the receiver that gets one message per debounced
    /// burst of changes to any watched file.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying file watcher cannot be created.
    pub fn new(debounce_duration: Duration) -> Result<(Self, mpsc::Receiver<()>)> {
        let (tx, rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
        let files: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));

        let filter = Arc::clone(&files);
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                let watched = filter.lock();
                if event.paths.iter().any(|p| watched.contains(p)) {
                    let _ = event_tx.send(event);
                }
            }
            Err(e) => tracing::warn!(error = %e, "file watcher reported an error"),
        })
        .map_err(|e| ConfigError::WatchError(format!("Failed to create file watcher: {}", e)))?;

        tokio::spawn(async move {
            while event_rx.recv().await.is_some() {
                // Swallow the rest of the burst.
                loop {
                    match timeout(debounce_duration, event_rx.recv()).await {
                        Ok(Some(_)) => continue,
                        Ok(None) | Err(_) => break,
                    }
                }

                tracing::debug!("configuration file changed");
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        Ok((
            Self {
                watcher: Mutex::new(watcher),
                debounce_duration,
                files,
                dirs: Mutex::new(Vec::new()),
            },
            rx,
        ))
    }

    /// Start watching a file for changes.
    ///
    /// The file itself does not need to exist yet, but its directory does.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be resolved or watched.
    pub fn watch(&self, path: impl AsRef<Path>) -> Result<()> {
        let (dir, file) = resolve(path.as_ref())?;

        {
            let mut dirs = self.dirs.lock();
            if !dirs.contains(&dir) {
                self.watcher
                    .lock()
                    .watch(&dir, RecursiveMode::NonRecursive)
                    .map_err(|e| {
                        ConfigError::WatchError(format!(
                            "Failed to watch {}: {}",
                            dir.display(),
                            e
                        ))
                    })?;
                dirs.push(dir);
            }
        }

        let mut files = self.files.lock();
        if !files.contains(&file) {
            tracing::debug!(path = %file.display(), "watching configuration file");
            files.push(file);
        }

        Ok(())
    }

    /// Stop watching a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or its directory unwatched.
    pub fn unwatch(&self, path: impl AsRef<Path>) -> Result<()> {
        let (dir, file) = resolve(path.as_ref())?;

        let dir_still_used = {
            let mut files = self.files.lock();
            files.retain(|p| p != &file);
            files.iter().any(|p| p.parent() == Some(dir.as_path()))
        };

        if !dir_still_used {
            let mut dirs = self.dirs.lock();
            if dirs.contains(&dir) {
                self.watcher.lock().unwatch(&dir).map_err(|e| {
                    ConfigError::WatchError(format!(
                        "Failed to unwatch {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
                dirs.retain(|d| d != &dir);
            }
        }

        Ok(())
    }

    /// Get the debounce duration for this watcher.
    pub fn debounce_duration(&self) -> Duration {
        self.debounce_duration
    }

    /// Get a list of currently watched files.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.files.lock().clone()
    }
}

/// Split a file path into its canonical directory and the file path inside it.
fn resolve(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let name = path.file_name().ok_or_else(|| {
        ConfigError::WatchError(format!("Not a file path: {}", path.display()))
    })?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let dir = parent.canonicalize().map_err(|e| {
        ConfigError::WatchError(format!("Failed to resolve {}: {}", parent.display(), e))
    })?;
    let file = dir.join(name);
    Ok((dir, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_watch_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "port: 8080").unwrap();

        let (watcher, _rx) = ConfigWatcher::new(Duration::from_millis(100)).unwrap();
        watcher.watch(&config_path).unwrap();
        watcher.watch(&config_path).unwrap();

        assert_eq!(watcher.watched_paths().len(), 1);
    }

    #[tokio::test]
    async fn test_watch_missing_directory() {
        let (watcher, _rx) = ConfigWatcher::new(Duration::from_millis(100)).unwrap();
        assert!(watcher.watch("/nonexistent/dir/config.yaml").is_err());
    }

    #[tokio::test]
    async fn test_watch_file_not_yet_created() {
        let temp_dir = TempDir::new().unwrap();
        let (watcher, _rx) = ConfigWatcher::new(Duration::from_millis(100)).unwrap();
        assert!(watcher.watch(temp_dir.path().join("later.yaml")).is_ok());
    }

    #[tokio::test]
    async fn test_file_change_triggers_signal() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "port: 8080").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(Duration::from_millis(100)).unwrap();
        watcher.watch(&config_path).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            fs::write(&config_path, "port: 9090").unwrap();
        });

        let result = timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(matches!(result, Ok(Some(()))));
    }

    #[tokio::test]
    async fn test_unwatch() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("a.yaml");
        let second = temp_dir.path().join("b.yaml");
        fs::write(&first, "a: 1").unwrap();
        fs::write(&second, "b: 2").unwrap();

        let (watcher, _rx) = ConfigWatcher::new(Duration::from_millis(100)).unwrap();
        watcher.watch(&first).unwrap();
        watcher.watch(&second).unwrap();
        assert_eq!(watcher.watched_paths().len(), 2);

        watcher.unwatch(&first).unwrap();
        assert_eq!(watcher.watched_paths().len(), 1);

        watcher.unwatch(&second).unwrap();
        assert!(watcher.watched_paths().is_empty());
    }

    #[tokio::test]
    async fn test_debounce_duration() {
        let (watcher, _rx) = ConfigWatcher::new(DEFAULT_DEBOUNCE).unwrap();
        assert_eq!(watcher.debounce_duration(), DEFAULT_DEBOUNCE);
    }
}
