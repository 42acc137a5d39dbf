//! Layers merged by a [`LayeredSource`](super::LayeredSource).

use crate::error::Result;

/// Raw key/value table produced by a layer.
pub type LayerTable = config::Map<String, config::Value>;

/// Trait for one layer of a [`LayeredSource`](super::LayeredSource).
///
/// Implement this trait to merge custom data (remote APIs, databases,
/// key-value stores) into the same tree as files and environment variables.
pub trait ConfigLayer: Send + Sync {
    /// Collect this layer's data as a table of top-level keys.
    ///
    /// The returned table is deep-merged with other layers according to precedence rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer cannot be read or parsed.
    fn collect(&self) -> Result<LayerTable>;

    /// Get a human-readable name for this layer (for logging/debugging).
    fn name(&self) -> String;

    /// Get the priority of this layer (higher = takes precedence).
    ///
    /// Default priorities:
    /// - Environment variables: 300
    /// - Later files: 110, 120, ...
    /// - First file: 100
    fn priority(&self) -> i32 {
        100
    }
}
