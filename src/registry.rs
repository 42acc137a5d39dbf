//! Keyed registry of live configuration cells.
//!
//! The registry is owned by the application's composition root. It maps
//! `(type, section)` to exactly one [`LiveConfigCell`] and hands out the cell
//! in the shapes consumers ask for: the cell itself, a current-value accessor,
//! an observable stream, or an owned instance resolved at lookup time.

use crate::core::{ConfigAccessor, ConfigObservable, LiveConfigCell, SectionKey};
use crate::error::{ConfigError, Result};
use crate::sources::ConfigurationSource;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type RegistryKey = (TypeId, SectionKey);

/// Type-erased view of a registered cell.
trait ErasedCell: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dispose(&self);
}

impl<T> ErasedCell for LiveConfigCell<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dispose(&self) {
        LiveConfigCell::dispose(self)
    }
}

/// Registry mapping `(type, section)` pairs to live configuration cells.
///
/// # Examples
///
/// ```rust
/// use live_config::prelude::*;
/// use live_config::sources::MemorySource;
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Feature {
///     enabled: bool,
/// }
///
/// # fn main() -> Result<()> {
/// let source = Arc::new(MemorySource::new());
/// let registry = ConfigRegistry::new(source.clone());
/// registry.register::<Feature>("Feature", Some(Feature { enabled: false }))?;
///
/// let accessor = registry.accessor::<Feature>("Feature")?;
/// assert!(!accessor.value()?.enabled);
///
/// source.set_serialized("Feature", &Feature { enabled: true })?;
/// assert!(accessor.value()?.enabled);
/// # Ok(())
/// # }
/// ```
pub struct ConfigRegistry {
    source: Arc<dyn ConfigurationSource>,
    cells: RwLock<HashMap<RegistryKey, Arc<dyn ErasedCell>>>,
}

impl ConfigRegistry {
    /// Create an empty registry whose cells all read from `source`.
    pub fn new(source: Arc<dyn ConfigurationSource>) -> Self {
        Self {
            source,
            cells: RwLock::new(HashMap::new()),
        }
    }

    /// Register a cell for `T` bound to `section`.
    ///
    /// If a cell already exists for this type and section it is returned
    /// unchanged and `default` is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a new cell cannot register its change watch.
    pub fn register<T>(
        &self,
        section: impl Into<SectionKey>,
        default: Option<T>,
    ) -> Result<LiveConfigCell<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let section = section.into();
        let key = (TypeId::of::<T>(), section.clone());

        let mut cells = self.cells.write();
        if let Some(existing) = cells.get(&key) {
            return downcast::<T>(existing.as_ref(), &section);
        }

        let cell = LiveConfigCell::new(section.clone(), Arc::clone(&self.source), default)?;
        cells.insert(key, Arc::new(cell.clone()));

        tracing::debug!(
            section = %section,
            type_name = std::any::type_name::<T>(),
            "Registered configuration cell"
        );
        Ok(cell)
    }

    /// Register a cell built by the caller, replacing nothing.
    ///
    /// Useful when the cell needs a validator or metrics.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Other`] if a cell is already registered for this
    /// type and section.
    pub fn insert<T>(&self, cell: LiveConfigCell<T>) -> Result<()>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let key = (TypeId::of::<T>(), cell.section().clone());
        let mut cells = self.cells.write();
        if cells.contains_key(&key) {
            return Err(ConfigError::Other(format!(
                "a cell for {} is already registered under \"{}\"",
                std::any::type_name::<T>(),
                cell.section()
            )));
        }
        cells.insert(key, Arc::new(cell));
        Ok(())
    }

    /// Look up the cell for `T` bound to `section`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotRegistered`] if no such cell exists.
    pub fn cell<T>(&self, section: impl Into<SectionKey>) -> Result<LiveConfigCell<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let section = section.into();
        let cells = self.cells.read();
        let erased = cells
            .get(&(TypeId::of::<T>(), section.clone()))
            .ok_or_else(|| ConfigError::NotRegistered {
                section: section.to_string(),
                type_name: std::any::type_name::<T>(),
            })?;
        downcast::<T>(erased.as_ref(), &section)
    }

    /// Current-value accessor for `T` bound to `section`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotRegistered`] if no such cell exists.
    pub fn accessor<T>(&self, section: impl Into<SectionKey>) -> Result<Arc<dyn ConfigAccessor<T>>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Ok(Arc::new(self.cell::<T>(section)?))
    }

    /// Observable stream of values for `T` bound to `section`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotRegistered`] if no such cell exists.
    pub fn observable<T>(
        &self,
        section: impl Into<SectionKey>,
    ) -> Result<Arc<dyn ConfigObservable<T>>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Ok(Arc::new(self.cell::<T>(section)?))
    }

    /// Owned instance of `T` as it is at resolution time.
    ///
    /// Later reloads do not affect the returned value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotRegistered`] if no such cell exists, or the
    /// cell's read error if it holds no value.
    pub fn resolve<T>(&self, section: impl Into<SectionKey>) -> Result<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.cell::<T>(section)?.get_cloned()
    }

    /// Whether a cell for `T` bound to `section` is registered.
    pub fn contains<T: 'static>(&self, section: impl Into<SectionKey>) -> bool {
        self.cells
            .read()
            .contains_key(&(TypeId::of::<T>(), section.into()))
    }

    /// Get the number of registered cells.
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// Whether no cell is registered.
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    /// Dispose every registered cell and clear the registry.
    pub fn dispose_all(&self) {
        let cells: Vec<_> = self.cells.write().drain().map(|(_, cell)| cell).collect();
        let count = cells.len();
        for cell in cells {
            cell.dispose();
        }
        tracing::info!(cells = count, "Disposed configuration registry");
    }
}

impl Drop for ConfigRegistry {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("source", &self.source.name())
            .field("cells", &self.len())
            .finish()
    }
}

fn downcast<T>(erased: &dyn ErasedCell, section: &SectionKey) -> Result<LiveConfigCell<T>>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    erased
        .as_any()
        .downcast_ref::<LiveConfigCell<T>>()
        .cloned()
        .ok_or_else(|| ConfigError::NotRegistered {
            section: section.to_string(),
            type_name: std::any::type_name::<T>(),
        })
}
