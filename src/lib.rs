//! # live-config
//!
//! Live, reactively reloaded typed configuration objects.
//!
//! ## Overview
//!
//! `live-config` binds a strongly typed value to one section of a
//! configuration source and keeps it current:
//! - Lock-free reads of the last successfully parsed value using `arc-swap`
//! - Automatic re-parse whenever the source signals a change
//! - Failed parses are logged and the last-known-good value is kept
//! - Observers get the current value on subscribe, then every update, in order
//! - Layered sources (files → env vars) with optional file watching
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use live_config::prelude::*;
//! use serde::Deserialize;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Deserialize, Clone)]
//! struct ServerConfig {
//!     port: u16,
//! }
//!
//! # async fn example() -> live_config::error::Result<()> {
//! // Layered source: default file, then environment overrides
//! let source = LayeredSource::builder()
//!     .with_file("config/default.yaml")
//!     .with_env_overrides("APP", "__")
//!     .with_file_watch(true)
//!     .build()
//!     .await?;
//!
//! let server = LiveConfigCell::<ServerConfig>::new("server", source, None)?;
//!
//! // Lock-free read
//! println!("Server port: {}", server.get_value()?.port);
//!
//! // React to every reload
//! let _subscription = server.subscribe_fn(|config: Arc<ServerConfig>| {
//!     println!("Server port is now {}", config.port);
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): reload layered sources when their files change
//! - `validation` (default): the [`core::Validate`] trait
//! - `tokio-runtime`: channel-based subscriptions without file watching
//! - `metrics`: OpenTelemetry reload and subscriber metrics

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod registry;
pub mod sources;

#[cfg(feature = "file-watch")]
pub mod notify;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        ConfigAccessor, ConfigObservable, FnObserver, LiveConfigCell, LiveConfigCellBuilder,
        Observer, SectionKey, Subscription,
    };
    pub use crate::error::{ConfigError, Result, ValidationError};
    pub use crate::registry::ConfigRegistry;
    pub use crate::sources::{ConfigurationSource, LayeredSource, MemorySource};

    #[cfg(feature = "validation")]
    pub use crate::core::Validate;
}
