//! Read side of the historical difficulty reference table, plus the JSON
//! import used to seed it.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::model::{datetime_from_text, decimal_from_text, DifficultyRow};
use super::schema::difficulty_records;
use super::DbPool;
use crate::error::{Error, Result};

/// One difficulty-adjustment epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyRecord {
    pub effective_at: DateTime<Utc>,
    pub difficulty: Decimal,
}

/// JSON shape accepted by `import`.
#[derive(Debug, Deserialize)]
pub struct DifficultyEntry {
    pub effective_at: DateTime<Utc>,
    pub difficulty: Decimal,
}

#[derive(Clone)]
pub struct DifficultyStore {
    pool: DbPool,
}

impl DifficultyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Every known epoch, newest first. The oracle caches this.
    pub fn load_all_descending(&self) -> Result<Vec<DifficultyRecord>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<DifficultyRow> = difficulty_records::table
            .order(difficulty_records::effective_at.desc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| {
                Ok(DifficultyRecord {
                    effective_at: datetime_from_text(&r.effective_at)?,
                    difficulty: decimal_from_text(&r.difficulty)?,
                })
            })
            .collect()
    }

    /// Replace-import a batch of epochs. Returns the number written.
    pub fn import(&self, entries: &[DifficultyEntry]) -> Result<usize> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<DifficultyRow> = entries
            .iter()
            .map(|e| DifficultyRow {
                effective_at: e.effective_at.to_rfc3339(),
                difficulty: e.difficulty.to_string(),
            })
            .collect();

        diesel::replace_into(difficulty_records::table)
            .values(&rows)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))
    }
}
