//! Example demonstrating live configuration cells.
//!
//! This example shows how to:
//! - Bind a typed cell to a section with a default
//! - Subscribe to reloads and receive the current value immediately
//! - Keep the last good value when an update is malformed
//! - Share cells through a registry and dispose them
//!
//! Run with: cargo run --example live_reload

use live_config::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeatureFlags {
    new_ui: bool,
    beta_features: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    port: u16,
}

/// Prints when its cell is disposed.
struct Audit;

impl Observer<ServerConfig> for Audit {
    fn on_next(&self, value: Arc<ServerConfig>) {
        println!("[audit] server port is {}", value.port);
    }

    fn on_complete(&self) {
        println!("[audit] server configuration closed");
    }
}

fn main() -> Result<()> {
    println!("=== Live Configuration Example ===\n");

    let source = Arc::new(MemorySource::new());
    let registry = ConfigRegistry::new(source.clone());

    let flags = registry.register(
        "features",
        Some(FeatureFlags {
            new_ui: false,
            beta_features: false,
        }),
    )?;
    println!("Initial flags (from default): {:?}\n", flags.get_value()?);

    let _flags_sub = flags.subscribe_fn(|flags: Arc<FeatureFlags>| {
        println!("[flags] new_ui={} beta={}", flags.new_ui, flags.beta_features);
    })?;

    println!("--- Update: enable the new UI ---");
    source.set_serialized(
        "features",
        &FeatureFlags {
            new_ui: true,
            beta_features: false,
        },
    )?;

    println!("\n--- Update: malformed data ---");
    source.set("features", "not a table");
    println!(
        "Still serving: {:?} (failed reloads: {})\n",
        flags.get_value()?,
        flags.stats().failures
    );

    source.set_serialized("server", &ServerConfig { port: 8080 })?;
    registry.register::<ServerConfig>("server", None)?;
    let _audit_sub = registry
        .observable::<ServerConfig>("server")?
        .subscribe(Arc::new(Audit))?;

    println!("--- Update: move the server ---");
    source.set_serialized("server", &ServerConfig { port: 9090 })?;

    let snapshot = registry.resolve::<ServerConfig>("server")?;
    println!("\nResolved server config: {:?}", snapshot);

    println!("\n--- Shutting down ---");
    registry.dispose_all();
    println!("Flags cell disposed: {}", flags.is_disposed());

    Ok(())
}
