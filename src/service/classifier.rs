//! Asset classifier: which generation units do we track, and who owns them.
//!
//! Process-wide state with an explicit load/invalidate lifecycle instead of
//! an ambient singleton, so tests can inject fixed reference data through
//! the [`UnitCatalog`] trait.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::adapter::store::units::UnitCatalog;
use crate::domain::UnitId;
use crate::error::Result;

/// Immutable view of the tracked-unit set, cheap to clone across tasks.
#[derive(Debug, Clone, Default)]
pub struct ClassifierSnapshot {
    units: Arc<HashMap<UnitId, String>>,
}

impl ClassifierSnapshot {
    /// Owner display name if the unit is tracked; `None` means not tracked,
    /// never an error.
    pub fn owner_of(&self, unit: &UnitId) -> Option<&str> {
        self.units.get(unit).map(String::as_str)
    }

    pub fn is_tracked(&self, unit: &UnitId) -> bool {
        self.units.contains_key(unit)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

pub struct AssetClassifier {
    catalog: Arc<dyn UnitCatalog>,
    cache: RwLock<Option<ClassifierSnapshot>>,
}

impl AssetClassifier {
    pub fn new(catalog: Arc<dyn UnitCatalog>) -> Self {
        Self {
            catalog,
            cache: RwLock::new(None),
        }
    }

    /// Current snapshot, loading from the catalog on first use.
    pub fn snapshot(&self) -> Result<ClassifierSnapshot> {
        if let Some(snapshot) = self.cache.read().as_ref() {
            return Ok(snapshot.clone());
        }
        self.load()
    }

    /// Force a reload from the backing catalog.
    pub fn load(&self) -> Result<ClassifierSnapshot> {
        let units = self.catalog.load()?;
        info!(tracked_units = units.len(), "Classifier loaded");
        let snapshot = ClassifierSnapshot {
            units: Arc::new(units),
        };
        *self.cache.write() = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next lookup reloads. Operational
    /// correction path, no process restart needed.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }
}
