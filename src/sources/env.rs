//! Environment variable configuration layer.

use super::{ConfigLayer, LayerTable};
use crate::error::{ConfigError, Result};
use config::Environment;

/// Environment variable configuration layer.
///
/// Maps variables with a prefix onto nested keys, splitting on a separator.
/// Values are parsed into numbers and booleans where possible.
///
/// # Examples
///
/// ```rust
/// use live_config::sources::EnvLayer;
///
/// // APP_SERVER__PORT=8080 -> server.port = 8080
/// let layer = EnvLayer::new("APP", "__");
/// ```
pub struct EnvLayer {
    prefix: String,
    separator: String,
    priority: i32,
}

impl EnvLayer {
    /// Create a new environment variable layer.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "APP")
    /// * `separator` - Separator for nested keys (e.g., "__" for APP_DB__HOST)
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            priority: 300,
        }
    }

    /// Set the priority for this layer.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl ConfigLayer for EnvLayer {
    fn collect(&self) -> Result<LayerTable> {
        let environment = Environment::with_prefix(&self.prefix)
            .prefix_separator("_")
            .separator(&self.separator)
            .try_parsing(true);

        config::Config::builder()
            .add_source(environment)
            .build()
            .and_then(|collected| collected.try_deserialize::<LayerTable>())
            .map_err(|e| {
                ConfigError::LoadError(format!(
                    "Failed to read environment with prefix {}: {}",
                    self.prefix, e
                ))
            })
    }

    fn name(&self) -> String {
        format!("env:{}*", self.prefix)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
