//! Configuration validation support.

use crate::error::ValidationError;

/// Trait for configuration validation.
///
/// Implement this trait on configuration types and call
/// [`LiveConfigCellBuilder::validated`](crate::core::LiveConfigCellBuilder::validated)
/// so that values failing validation never replace the stored one.
///
/// # Examples
///
/// ```rust
/// use live_config::core::Validate;
/// use live_config::error::ValidationError;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, Clone)]
/// struct PoolConfig {
///     min_connections: usize,
///     max_connections: usize,
/// }
///
/// impl Validate for PoolConfig {
///     fn validate(&self) -> Result<(), ValidationError> {
///         let mut errors = Vec::new();
///         if self.max_connections == 0 {
///             errors.push(ValidationError::invalid_field(
///                 "max_connections",
///                 "must be greater than 0",
///             ));
///         }
///         if self.min_connections > self.max_connections {
///             errors.push(ValidationError::custom(
///                 "min_connections must not exceed max_connections",
///             ));
///         }
///
///         match errors.len() {
///             0 => Ok(()),
///             1 => Err(errors.remove(0)),
///             _ => Err(ValidationError::Multiple(errors)),
///         }
///     }
/// }
/// ```
pub trait Validate {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self) -> Result<(), ValidationError>;
}
