//! Shared error mapping from pool and Diesel failures to the domain's
//! [`PersistenceError`].
//!
//! Raw driver messages can carry connection strings, so only category-level
//! text crosses into the domain; the original error is logged here at debug
//! level for diagnosis.

use tracing::debug;

use crate::domain::ports::PersistenceError;

use super::pool::PoolError;

/// Map pool checkout/build failures to a connection-category error.
pub(crate) fn map_pool_error(error: PoolError) -> PersistenceError {
    match error {
        PoolError::Setup(message) | PoolError::Checkout(message) => {
            PersistenceError::connection(message)
        }
    }
}

/// Map Diesel execution failures to domain persistence errors.
pub(crate) fn map_diesel_error(error: diesel::result::Error) -> PersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => PersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => PersistenceError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            PersistenceError::connection("database connection error")
        }
        _ => PersistenceError::query("database error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_map_to_connection() {
        let mapped = map_pool_error(PoolError::Checkout("timed out".to_owned()));
        assert_eq!(mapped, PersistenceError::connection("timed out"));
    }

    #[rstest]
    fn not_found_maps_to_query() {
        let mapped = map_diesel_error(diesel::result::Error::NotFound);
        assert_eq!(mapped, PersistenceError::query("record not found"));
    }
}
