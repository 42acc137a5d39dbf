//! File-backed configuration layer.

use super::{ConfigLayer, LayerTable};
use crate::error::{ConfigError, Result};
use config::{File, FileFormat};
use std::path::{Path, PathBuf};

/// File-backed configuration layer.
///
/// Reads YAML, TOML, or JSON files, picking the format from the file extension.
///
/// # Examples
///
/// ```rust,no_run
/// use live_config::sources::FileLayer;
///
/// let layer = FileLayer::new("config/default.yaml");
/// let local = FileLayer::new("config/local.toml").optional();
/// ```
pub struct FileLayer {
    path: PathBuf,
    priority: i32,
    required: bool,
}

impl FileLayer {
    /// Create a layer for a required file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            priority: 100,
            required: true,
        }
    }

    /// Set the priority for this layer.
    ///
    /// Higher priority layers override lower priority ones.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Treat a missing file as an empty layer instead of an error.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// The file this layer reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Map the file extension onto a parser.
    fn format(&self) -> Result<FileFormat> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ConfigError::LoadError(format!(
                    "Unable to determine file format for: {}",
                    self.path.display()
                ))
            })?;

        match extension {
            "yaml" | "yml" => Ok(FileFormat::Yaml),
            "toml" => Ok(FileFormat::Toml),
            "json" => Ok(FileFormat::Json),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json",
                extension
            ))),
        }
    }
}

impl ConfigLayer for FileLayer {
    fn collect(&self) -> Result<LayerTable> {
        let format = self.format()?;

        if !self.path.exists() {
            if self.required {
                return Err(ConfigError::LoadError(format!(
                    "Configuration file not found: {}",
                    self.path.display()
                )));
            }
            return Ok(LayerTable::new());
        }

        let parsed = config::Config::builder()
            .add_source(File::from(self.path.as_path()).format(format).required(true))
            .build()
            .map_err(|e| {
                ConfigError::LoadError(format!(
                    "Failed to load file {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        parsed.try_deserialize::<LayerTable>().map_err(|e| {
            ConfigError::DeserializationError(format!(
                "Failed to parse file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert!(matches!(
            FileLayer::new("config.yml").format(),
            Ok(FileFormat::Yaml)
        ));
        assert!(matches!(
            FileLayer::new("config.toml").format(),
            Ok(FileFormat::Toml)
        ));
        assert!(matches!(
            FileLayer::new("config.json").format(),
            Ok(FileFormat::Json)
        ));
        assert!(FileLayer::new("config.txt").format().is_err());
        assert!(FileLayer::new("config").format().is_err());
    }

    #[test]
    fn test_collect_nested_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(
            &config_path,
            r#"
server:
  port: 8080
  host: localhost
"#,
        )
        .unwrap();

        let table = FileLayer::new(&config_path).collect().unwrap();
        let server = table.get("server").cloned().unwrap();
        let server = server.into_table().unwrap();
        assert_eq!(server.get("port").cloned().unwrap().into_int().unwrap(), 8080);
    }

    #[test]
    fn test_missing_required_file() {
        let layer = FileLayer::new("/nonexistent/config.yaml");
        assert!(layer.collect().is_err());
    }

    #[test]
    fn test_missing_optional_file() {
        let layer = FileLayer::new("/nonexistent/config.yaml").optional();
        assert!(layer.collect().unwrap().is_empty());
    }

    #[test]
    fn test_name_and_priority() {
        let layer = FileLayer::new("config.yaml").with_priority(200);
        assert_eq!(layer.priority(), 200);
        assert!(layer.name().contains("config.yaml"));
    }
}
