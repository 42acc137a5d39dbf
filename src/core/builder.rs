//! Builder for constructing LiveConfigCell instances.

use crate::core::LiveConfigCell;
use crate::core::cell::Validator;
use crate::core::SectionKey;
use crate::error::{Result, ValidationError};
use crate::sources::ConfigurationSource;
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[cfg(feature = "validation")]
use crate::core::Validate;

#[cfg(feature = "metrics")]
use crate::metrics::ConfigMetrics;

/// Builder for constructing a [`LiveConfigCell`].
///
/// # Examples
///
/// ```rust
/// use live_config::prelude::*;
/// use live_config::sources::MemorySource;
/// use serde::Deserialize;
/// use std::sync::Arc;
///
/// #[derive(Debug, Deserialize, Clone)]
/// struct ServerConfig {
///     port: u16,
/// }
///
/// # fn main() -> Result<()> {
/// let source = Arc::new(MemorySource::new());
/// let cell = LiveConfigCell::builder("server")
///     .with_default(ServerConfig { port: 8080 })
///     .with_validation(|config: &ServerConfig| {
///         if config.port < 1024 {
///             return Err(ValidationError::invalid_field("port", "must be >= 1024"));
///         }
///         Ok(())
///     })
///     .build(source)?;
///
/// assert_eq!(cell.get_value()?.port, 8080);
/// # Ok(())
/// # }
/// ```
pub struct LiveConfigCellBuilder<T> {
    section: SectionKey,
    default: Option<T>,
    validator: Option<Validator<T>>,
    #[cfg(feature = "metrics")]
    metrics: Option<ConfigMetrics>,
}

impl<T> LiveConfigCellBuilder<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Create a builder for a cell bound to `section`.
    pub fn new(section: impl Into<SectionKey>) -> Self {
        Self {
            section: section.into(),
            default: None,
            validator: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Value to use when the section has no usable data at construction time.
    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    /// Add a validation function every parsed value must pass.
    ///
    /// A value that fails validation is handled like one that failed to parse:
    /// at construction the default is used, on reload the last-known-good value
    /// is kept.
    pub fn with_validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Validate parsed values with their [`Validate`] implementation.
    #[cfg(feature = "validation")]
    pub fn validated(self) -> Self
    where
        T: Validate,
    {
        self.with_validation(|config: &T| config.validate())
    }

    /// Record reload and subscriber metrics for this cell.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: ConfigMetrics) -> Self {
        self.metrics = Some(metrics.with_section(self.section.as_str()));
        self
    }

    /// Build the cell.
    ///
    /// Performs the initial parse and registers the change watch on `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch cannot be registered.
    pub fn build(self, source: Arc<dyn ConfigurationSource>) -> Result<LiveConfigCell<T>> {
        LiveConfigCell::create(
            self.section,
            source,
            self.default,
            self.validator,
            #[cfg(feature = "metrics")]
            self.metrics,
        )
    }
}
