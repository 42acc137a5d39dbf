//! Error types for live-config.

/// Result type alias for live-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value was requested before any successful parse and no default was supplied.
    #[error("Value of \"{section}\" for \"{type_name}\" not currently set")]
    NotConfigured {
        /// Section the cell is bound to
        section: String,
        /// Rust type name of the configuration object
        type_name: &'static str,
    },

    /// Data for a reload could not be turned into the configuration type.
    ///
    /// Only reported through logs and reload statistics, never handed to observers.
    #[error("Failed to reload \"{section}\": {reason}")]
    ReloadParse {
        /// Section the cell is bound to
        section: String,
        /// What went wrong
        reason: String,
    },

    /// The cell was disposed and can no longer be used.
    #[error("Configuration cell for \"{0}\" has been disposed")]
    Disposed(String),

    /// No cell is registered for the requested type and section.
    #[error("No configuration registered for \"{section}\" as \"{type_name}\"")]
    NotRegistered {
        /// Requested section
        section: String,
        /// Requested type name
        type_name: &'static str,
    },

    /// Failed to load configuration from a source.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// Failed to deserialize configuration.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// A parsed value was rejected by its validator.
    #[error("Rejected by validation: {0}")]
    ValidationError(String),

    /// Change notifications could not be set up or torn down.
    #[error("Watch error: {0}")]
    WatchError(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Returns true for [`ConfigError::NotConfigured`].
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::DeserializationError(err.to_string())
    }
}

/// Why a parsed configuration value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Free-form rejection reason.
    #[error("{0}")]
    Custom(String),

    /// One field holds an unacceptable value.
    #[error("{field}: {reason}")]
    InvalidField {
        /// Field name or dotted path
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Several independent problems.
    #[error("{} problems: {}", .0.len(), join(.0))]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a free-form validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an error for a single field.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}
