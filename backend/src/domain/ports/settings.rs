//! Port for the admin settings key/value store.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::ports::PersistenceError;
use crate::domain::settings::Setting;

/// Key/value settings store used for the tracking kill-switch.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch a setting row by key, if present.
    async fn get(&self, key: &str) -> Result<Option<Setting>, PersistenceError>;

    /// Insert or replace the value for a key, bumping `updated_at`.
    async fn upsert(&self, key: &str, value: &str) -> Result<Setting, PersistenceError>;
}
