//! File watching that turns file changes into reload signals.

pub mod watcher;

pub use watcher::{ConfigWatcher, DEFAULT_DEBOUNCE};
