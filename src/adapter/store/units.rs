//! Tracked-unit reference table: which BM units we monitor and who owns them.

use std::collections::HashMap;

use diesel::prelude::*;
use serde::Deserialize;

use super::model::TrackedUnitRow;
use super::schema::tracked_units;
use super::DbPool;
use crate::domain::UnitId;
use crate::error::{Error, Result};

/// JSON shape accepted by `import`.
#[derive(Debug, Deserialize)]
pub struct TrackedUnitEntry {
    pub unit_id: UnitId,
    pub owner: String,
}

/// Source of tracked-unit reference data. The classifier loads through this
/// so tests can substitute a fixed map.
pub trait UnitCatalog: Send + Sync {
    fn load(&self) -> Result<HashMap<UnitId, String>>;
}

#[derive(Clone)]
pub struct UnitStore {
    pool: DbPool,
}

impl UnitStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn import(&self, entries: &[TrackedUnitEntry]) -> Result<usize> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<TrackedUnitRow> = entries
            .iter()
            .map(|e| TrackedUnitRow {
                unit_id: e.unit_id.to_string(),
                owner: e.owner.clone(),
            })
            .collect();

        diesel::replace_into(tracked_units::table)
            .values(&rows)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub fn list(&self) -> Result<Vec<TrackedUnitEntry>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<TrackedUnitRow> = tracked_units::table
            .order(tracked_units::unit_id.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| TrackedUnitEntry {
                unit_id: UnitId::new(r.unit_id),
                owner: r.owner,
            })
            .collect())
    }
}

impl UnitCatalog for UnitStore {
    fn load(&self) -> Result<HashMap<UnitId, String>> {
        Ok(self
            .list()?
            .into_iter()
            .map(|e| (e.unit_id, e.owner))
            .collect())
    }
}
