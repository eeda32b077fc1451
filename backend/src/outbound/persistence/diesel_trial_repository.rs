//! PostgreSQL-backed `TrialRepository` implementation.
//!
//! The entitlement lookup is an OR across the email and IP columns, so a
//! trial claimed from either identity blocks a fresh claim from the other.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PersistenceError, TrialRepository};
use crate::domain::trial::{NewTrial, Trial};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewTrialRow, TrialRow};
use super::pool::DbPool;
use super::schema::trials;

/// Diesel-backed implementation of the `TrialRepository` port.
#[derive(Clone)]
pub struct DieselTrialRepository {
    pool: DbPool,
}

impl DieselTrialRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_trial(row: TrialRow) -> Trial {
    Trial {
        id: row.id,
        email: row.email,
        ip_address: row.ip_address,
        email_verified: row.email_verified,
        created_at: row.created_at,
    }
}

#[async_trait]
impl TrialRepository for DieselTrialRepository {
    async fn find_matching(
        &self,
        email: &str,
        ip_address: &str,
    ) -> Result<Option<Trial>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TrialRow> = trials::table
            .filter(trials::email.eq(email).or(trials::ip_address.eq(ip_address)))
            .order(trials::created_at.asc())
            .select(TrialRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_trial))
    }

    async fn insert(&self, trial: NewTrial) -> Result<Trial, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewTrialRow {
            email: &trial.email,
            ip_address: &trial.ip_address,
            email_verified: false,
            created_at: Utc::now(),
        };
        let stored: TrialRow = diesel::insert_into(trials::table)
            .values(&row)
            .returning(TrialRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_trial(stored))
    }
}
