//! ReadingStore trait and implementations.
//!
//! Readings are keyed by (owner, date). Writing a reading for a date that
//! already has one replaces it.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reef_core::{Dated, ParameterKey, ParameterReading, ParameterValues, Threshold, ThresholdSet};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Row};
use tracing::warn;
use uuid::Uuid;

// ------------------------------------------------------------------ //
//  Domain types                                                       //
// ------------------------------------------------------------------ //

/// A reading as persisted.
///
/// `date` is the stored text. Rows written by older clients may carry a
/// date that no longer parses; they are still returned.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReading {
    pub date: String,
    pub values: ParameterValues,
    pub updated_at: DateTime<Utc>,
}

impl Dated for StoredReading {
    fn date_text(&self) -> &str {
        &self.date
    }
}

// ------------------------------------------------------------------ //
//  Trait                                                              //
// ------------------------------------------------------------------ //

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Insert or replace the owner's reading for `reading.date`.
    async fn upsert_reading(
        &self,
        owner: Uuid,
        reading: &ParameterReading,
    ) -> Result<StoredReading>;

    /// Every reading of `owner`, in no particular order.
    async fn list_readings(&self, owner: Uuid) -> Result<Vec<StoredReading>>;

    async fn get_reading(&self, owner: Uuid, date: &str) -> Result<Option<StoredReading>>;

    /// Returns whether a reading was removed.
    async fn delete_reading(&self, owner: Uuid, date: &str) -> Result<bool>;

    async fn get_thresholds(&self, owner: Uuid) -> Result<ThresholdSet>;

    /// Replace the owner's whole threshold set.
    async fn put_thresholds(&self, owner: Uuid, thresholds: &ThresholdSet) -> Result<()>;
}

// ------------------------------------------------------------------ //
//  MemoryReadingStore (dev / tests)                                   //
// ------------------------------------------------------------------ //

type ReadingsByOwner = HashMap<Uuid, BTreeMap<String, StoredReading>>;

/// In-process store used when no database is configured and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryReadingStore {
    readings: Arc<Mutex<ReadingsByOwner>>,
    thresholds: Arc<Mutex<HashMap<Uuid, ThresholdSet>>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a row verbatim, bypassing validation.
    pub fn insert_raw(&self, owner: Uuid, reading: StoredReading) -> Result<()> {
        self.lock_readings()?
            .entry(owner)
            .or_default()
            .insert(reading.date.clone(), reading);
        Ok(())
    }

    fn lock_readings(&self) -> Result<std::sync::MutexGuard<'_, ReadingsByOwner>> {
        self.readings
            .lock()
            .map_err(|_| anyhow!("reading store lock poisoned"))
    }

    fn lock_thresholds(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, ThresholdSet>>> {
        self.thresholds
            .lock()
            .map_err(|_| anyhow!("threshold store lock poisoned"))
    }
}

#[async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn upsert_reading(
        &self,
        owner: Uuid,
        reading: &ParameterReading,
    ) -> Result<StoredReading> {
        let stored = StoredReading {
            date: reading.date.to_string(),
            values: reading.values.clone(),
            updated_at: Utc::now(),
        };
        self.insert_raw(owner, stored.clone())?;
        Ok(stored)
    }

    async fn list_readings(&self, owner: Uuid) -> Result<Vec<StoredReading>> {
        Ok(self
            .lock_readings()?
            .get(&owner)
            .map(|by_date| by_date.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_reading(&self, owner: Uuid, date: &str) -> Result<Option<StoredReading>> {
        Ok(self
            .lock_readings()?
            .get(&owner)
            .and_then(|by_date| by_date.get(date).cloned()))
    }

    async fn delete_reading(&self, owner: Uuid, date: &str) -> Result<bool> {
        Ok(self
            .lock_readings()?
            .get_mut(&owner)
            .and_then(|by_date| by_date.remove(date))
            .is_some())
    }

    async fn get_thresholds(&self, owner: Uuid) -> Result<ThresholdSet> {
        Ok(self.lock_thresholds()?.get(&owner).cloned().unwrap_or_default())
    }

    async fn put_thresholds(&self, owner: Uuid, thresholds: &ThresholdSet) -> Result<()> {
        self.lock_thresholds()?.insert(owner, thresholds.clone());
        Ok(())
    }
}

// ------------------------------------------------------------------ //
//  PgReadingStore (production)                                        //
// ------------------------------------------------------------------ //

/// Postgres-backed store.
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }

    /// Create the reading and threshold tables if they don't exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reef_reading (
                owner_id         UUID NOT NULL,
                reading_date     TEXT NOT NULL,
                parameter_values JSONB NOT NULL DEFAULT '{}',
                updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (owner_id, reading_date)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create reef_reading table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reef_threshold (
                owner_id  UUID NOT NULL,
                parameter TEXT NOT NULL,
                min_value DOUBLE PRECISION,
                max_value DOUBLE PRECISION,
                PRIMARY KEY (owner_id, parameter)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create reef_threshold table")?;

        Ok(())
    }
}

fn reading_from_row(row: &sqlx::postgres::PgRow) -> Result<StoredReading> {
    let Json(values): Json<ParameterValues> = row
        .try_get("parameter_values")
        .context("Malformed parameter_values column")?;
    Ok(StoredReading {
        date: row.try_get("reading_date")?,
        values,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn upsert_reading(
        &self,
        owner: Uuid,
        reading: &ParameterReading,
    ) -> Result<StoredReading> {
        let row = sqlx::query(
            r#"
            INSERT INTO reef_reading (owner_id, reading_date, parameter_values, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (owner_id, reading_date) DO UPDATE SET
                parameter_values = EXCLUDED.parameter_values,
                updated_at       = EXCLUDED.updated_at
            RETURNING reading_date, parameter_values, updated_at
            "#,
        )
        .bind(owner)
        .bind(reading.date.to_string())
        .bind(Json(&reading.values))
        .fetch_one(&self.pool)
        .await
        .context("UPSERT reading failed")?;

        reading_from_row(&row)
    }

    async fn list_readings(&self, owner: Uuid) -> Result<Vec<StoredReading>> {
        let rows = sqlx::query(
            r#"
            SELECT reading_date, parameter_values, updated_at
            FROM reef_reading
            WHERE owner_id = $1
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .context("LIST readings failed")?;

        rows.iter().map(reading_from_row).collect()
    }

    async fn get_reading(&self, owner: Uuid, date: &str) -> Result<Option<StoredReading>> {
        let row = sqlx::query(
            r#"
            SELECT reading_date, parameter_values, updated_at
            FROM reef_reading
            WHERE owner_id = $1 AND reading_date = $2
            "#,
        )
        .bind(owner)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .context("SELECT reading failed")?;

        row.as_ref().map(reading_from_row).transpose()
    }

    async fn delete_reading(&self, owner: Uuid, date: &str) -> Result<bool> {
        let affected = sqlx::query(
            r#"DELETE FROM reef_reading WHERE owner_id = $1 AND reading_date = $2"#,
        )
        .bind(owner)
        .bind(date)
        .execute(&self.pool)
        .await
        .context("DELETE reading failed")?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn get_thresholds(&self, owner: Uuid) -> Result<ThresholdSet> {
        let rows = sqlx::query(
            r#"
            SELECT parameter, min_value, max_value
            FROM reef_threshold
            WHERE owner_id = $1
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .context("SELECT thresholds failed")?;

        let mut thresholds = ThresholdSet::new();
        for r in &rows {
            let name: String = r.try_get("parameter")?;
            let key: ParameterKey = match name.parse() {
                Ok(key) => key,
                Err(e) => {
                    warn!(%owner, error = %e, "skipping stored threshold");
                    continue;
                }
            };
            thresholds.insert(
                key,
                Threshold {
                    min: r.try_get("min_value")?,
                    max: r.try_get("max_value")?,
                },
            );
        }
        Ok(thresholds)
    }

    async fn put_thresholds(&self, owner: Uuid, thresholds: &ThresholdSet) -> Result<()> {
        let mut tx = self.pool.begin().await.context("BEGIN failed")?;

        sqlx::query("DELETE FROM reef_threshold WHERE owner_id = $1")
            .bind(owner)
            .execute(&mut *tx)
            .await
            .context("DELETE thresholds failed")?;

        for (key, t) in thresholds {
            sqlx::query(
                r#"
                INSERT INTO reef_threshold (owner_id, parameter, min_value, max_value)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(owner)
            .bind(key.as_str())
            .bind(t.min)
            .bind(t.max)
            .execute(&mut *tx)
            .await
            .context("INSERT threshold failed")?;
        }

        tx.commit().await.context("COMMIT failed")?;
        Ok(())
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
