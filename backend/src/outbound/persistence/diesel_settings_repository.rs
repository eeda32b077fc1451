//! PostgreSQL-backed `SettingsRepository` implementation.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PersistenceError, SettingsRepository};
use crate::domain::settings::Setting;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewSettingRow, SettingRow};
use super::pool::DbPool;
use super::schema::admin_settings;

/// Diesel-backed implementation of the `SettingsRepository` port.
#[derive(Clone)]
pub struct DieselSettingsRepository {
    pool: DbPool,
}

impl DieselSettingsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_setting(row: SettingRow) -> Setting {
    Setting {
        key: row.key,
        value: row.value,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl SettingsRepository for DieselSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<SettingRow> = admin_settings::table
            .find(key)
            .select(SettingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_setting))
    }

    async fn upsert(&self, key: &str, value: &str) -> Result<Setting, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewSettingRow {
            key,
            value,
            updated_at: Utc::now(),
        };
        let stored: SettingRow = diesel::insert_into(admin_settings::table)
            .values(&row)
            .on_conflict(admin_settings::key)
            .do_update()
            .set((
                admin_settings::value.eq(value),
                admin_settings::updated_at.eq(row.updated_at),
            ))
            .returning(SettingRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_setting(stored))
    }
}
