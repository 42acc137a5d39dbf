//! Configuration sources and their change notifications.

mod config_source;
mod env;
mod file;
mod layer;
mod layered;
mod loader;
mod memory;
mod notifier;

pub use config_source::{ChangeCallback, ConfigurationSource, WatchHandle};
pub use env::EnvLayer;
pub use file::FileLayer;
pub use layer::{ConfigLayer, LayerTable};
pub use layered::{LayeredSource, LayeredSourceBuilder};
pub use loader::ConfigLoader;
pub use memory::MemorySource;
pub use notifier::ChangeNotifier;
