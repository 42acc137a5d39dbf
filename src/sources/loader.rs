//! Merges configuration layers into a single tree.

use super::{ConfigLayer, LayerTable};
use crate::error::{ConfigError, Result};
use config::{Value, ValueKind};

/// Loads and merges configuration from multiple layers.
///
/// Layers are applied in priority order (lowest first). Tables are merged
/// recursively, so a higher priority layer only replaces the leaves it sets.
pub struct ConfigLoader {
    layers: Vec<Box<dyn ConfigLayer>>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a configuration layer.
    pub fn add_layer(&mut self, layer: Box<dyn ConfigLayer>) {
        self.layers.push(layer);
    }

    /// Whether no layers were added.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Load and merge every layer into one root table.
    ///
    /// # Errors
    ///
    /// Returns an error if no layers are configured or any layer fails to load.
    pub fn load(&self) -> Result<LayerTable> {
        if self.layers.is_empty() {
            return Err(ConfigError::LoadError(
                "No configuration layers specified".to_string(),
            ));
        }

        let mut root = LayerTable::new();
        for layer in self.sorted() {
            let table = layer.collect().map_err(|e| {
                ConfigError::LoadError(format!("Failed to load layer '{}': {}", layer.name(), e))
            })?;
            merge_table(&mut root, table);
        }

        Ok(root)
    }

    /// Get the list of layer names in priority order.
    pub fn layer_names(&self) -> Vec<String> {
        self.sorted().iter().map(|l| l.name()).collect()
    }

    fn sorted(&self) -> Vec<&dyn ConfigLayer> {
        let mut sorted: Vec<&dyn ConfigLayer> = self.layers.iter().map(|l| l.as_ref()).collect();
        sorted.sort_by_key(|l| l.priority());
        sorted
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge `overlay` into `base`, recursing into tables present on both sides.
fn merge_table(base: &mut LayerTable, overlay: LayerTable) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

fn merge_value(base: &mut Value, overlay: Value) {
    match overlay.kind {
        ValueKind::Table(overlay_table) => match &mut base.kind {
            ValueKind::Table(base_table) => merge_table(base_table, overlay_table),
            kind => *kind = ValueKind::Table(overlay_table),
        },
        kind => base.kind = kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockLayer {
        name: String,
        priority: i32,
        values: LayerTable,
    }

    impl MockLayer {
        fn new(name: &str, priority: i32) -> Self {
            Self {
                name: name.to_string(),
                priority,
                values: LayerTable::new(),
            }
        }

        fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
            self.values.insert(key.to_string(), value.into());
            self
        }
    }

    impl ConfigLayer for MockLayer {
        fn collect(&self) -> Result<LayerTable> {
            Ok(self.values.clone())
        }

        fn name(&self) -> String {
            self.name.clone()
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    fn table(entries: &[(&str, Value)]) -> Value {
        let mut map = LayerTable::new();
        for (key, value) in entries {
            map.insert(key.to_string(), value.clone());
        }
        Value::from(map)
    }

    #[test]
    fn test_empty_loader() {
        let loader = ConfigLoader::new();
        assert!(loader.is_empty());
        assert!(loader.load().is_err());
    }

    #[test]
    fn test_precedence() {
        let mut loader = ConfigLoader::new();
        loader.add_layer(Box::new(
            MockLayer::new("override", 200).with_value("port", 9090i64),
        ));
        loader.add_layer(Box::new(
            MockLayer::new("default", 100)
                .with_value("port", 8080i64)
                .with_value("host", "localhost"),
        ));

        let root = loader.load().unwrap();
        assert_eq!(root.get("port").cloned().unwrap().into_int().unwrap(), 9090);
        assert_eq!(
            root.get("host").cloned().unwrap().into_string().unwrap(),
            "localhost"
        );
    }

    #[test]
    fn test_nested_tables_merge() {
        let mut loader = ConfigLoader::new();
        loader.add_layer(Box::new(MockLayer::new("default", 100).with_value(
            "server",
            table(&[
                ("port", Value::from(8080i64)),
                ("host", Value::from("localhost")),
            ]),
        )));
        loader.add_layer(Box::new(
            MockLayer::new("override", 200)
                .with_value("server", table(&[("port", Value::from(9090i64))])),
        ));

        let root = loader.load().unwrap();
        let server = root.get("server").cloned().unwrap().into_table().unwrap();
        assert_eq!(server.get("port").cloned().unwrap().into_int().unwrap(), 9090);
        assert_eq!(
            server.get("host").cloned().unwrap().into_string().unwrap(),
            "localhost"
        );
    }

    #[test]
    fn test_layer_names() {
        let mut loader = ConfigLoader::new();
        loader.add_layer(Box::new(MockLayer::new("layer1", 100)));
        loader.add_layer(Box::new(MockLayer::new("layer2", 200)));
        loader.add_layer(Box::new(MockLayer::new("layer3", 50)));

        assert_eq!(loader.layer_names(), vec!["layer3", "layer1", "layer2"]);
    }
}
