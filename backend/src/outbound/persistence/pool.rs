//! bb8-backed async connection pooling for the Diesel adapters.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// How long a checkout waits for a free connection before failing.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure while standing up the pool or borrowing a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("connection pool setup failed: {0}")]
    Setup(String),
    #[error("connection checkout failed: {0}")]
    Checkout(String),
}

/// Cloneable handle to the shared PostgreSQL connection pool.
///
/// Every persistence adapter holds one. Checkouts are async and bounded by
/// [`CHECKOUT_TIMEOUT`], so a saturated pool surfaces as an error instead
/// of stalling the runtime.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Open a pool against `database_url` holding at most `max_connections`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Setup`] when the pool cannot be constructed.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let inner = Pool::builder()
            .max_size(max_connections)
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)
            .await
            .map_err(|err| PoolError::Setup(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Borrow a connection, waiting up to the checkout timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Checkout`] when no connection frees up in time.
    pub(crate) async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::Checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn errors_carry_their_cause() {
        let setup = PoolError::Setup("invalid url".to_owned());
        assert!(setup.to_string().contains("invalid url"));
        let checkout = PoolError::Checkout("timed out".to_owned());
        assert!(checkout.to_string().contains("timed out"));
    }
}
