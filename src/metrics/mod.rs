//! Built-in metrics for live configuration cells.
//!
//! Provides OpenTelemetry metrics tracking, labelled with the cell's section:
//! - Reload attempts/success/failures
//! - Reload duration
//! - Active subscribers
//! - Validation failures
//!
//! # Examples
//!
//! ```rust,no_run
//! use live_config::prelude::*;
//! use live_config::metrics::ConfigMetrics;
//! use live_config::sources::MemorySource;
//! use opentelemetry::global;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<()> {
//! let metrics = ConfigMetrics::new(global::meter("my-app"));
//! let source = Arc::new(MemorySource::new());
//!
//! let cell = LiveConfigCell::<AppConfig>::builder("app")
//!     .with_metrics(metrics)
//!     .build(source)?;
//! # Ok(())
//! # }
//! # #[derive(serde::Deserialize, Clone)] struct AppConfig {}
//! ```

mod config_metrics;

pub use config_metrics::ConfigMetrics;
