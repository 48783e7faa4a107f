use std::time::Duration;

use bb8::{Pool, PooledConnection};
use config_loader::database::MssqlConfig;

use crate::ConnectionResult;
use crate::adapter::{ConnectionAdapter, MssqlAdapter};
use crate::driver::Driver;
use crate::error::ConnectionError;
use crate::handle::ConnectionHandle;
use crate::mssql::TiberiusDriver;

pub type MssqlPool = Pool<MssqlConnectionManager<TiberiusDriver>>;
pub type MssqlPooledConnection<'a> = PooledConnection<'a, MssqlConnectionManager<TiberiusDriver>>;

/// bb8 manager that delegates the connection lifecycle to an adapter.
///
/// bb8 owns checkout timeouts, retry, and eviction policy; this type only
/// answers the lifecycle hooks. A handle that fails a query on checkout
/// comes back through `is_valid`/`has_broken` and gets evicted there.
pub struct MssqlConnectionManager<D: Driver> {
    adapter: MssqlAdapter<D>,
    config: MssqlConfig,
}

impl<D: Driver> MssqlConnectionManager<D> {
    pub fn new(adapter: MssqlAdapter<D>, config: MssqlConfig) -> Self {
        Self { adapter, config }
    }

    pub fn adapter(&self) -> &MssqlAdapter<D> {
        &self.adapter
    }
}

impl<D: Driver> bb8::ManageConnection for MssqlConnectionManager<D> {
    type Connection = ConnectionHandle<D>;
    type Error = ConnectionError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        self.adapter.connect(&self.config).await
    }

    async fn is_valid(&self, handle: &mut Self::Connection) -> Result<(), Self::Error> {
        self.adapter.ping(handle).await
    }

    fn has_broken(&self, handle: &mut Self::Connection) -> bool {
        !self.adapter.validate(handle)
    }
}

/// Build a connection pool for one SQL Server target.
pub async fn create_mssql_pool(config: MssqlConfig) -> ConnectionResult<MssqlPool> {
    let max_size = config.pool_size.unwrap_or(10);
    let min_idle = config.min_idle;
    let connection_timeout =
        Duration::from_secs(u64::from(config.connection_timeout.unwrap_or(30)));

    let manager = MssqlConnectionManager::new(TiberiusDriver::adapter(), config);

    let pool = Pool::builder()
        .max_size(max_size)
        .min_idle(min_idle)
        .connection_timeout(connection_timeout)
        .build(manager)
        .await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use crate::testing::MockDriver;
    use bb8::ManageConnection;

    fn config() -> MssqlConfig {
        MssqlConfig::new("db.internal", "orders")
    }

    fn manager(driver: MockDriver) -> MssqlConnectionManager<MockDriver> {
        MssqlConnectionManager::new(MssqlAdapter::new(driver), config())
    }

    #[tokio::test]
    async fn test_manager_connect_yields_validated_handle() {
        let manager = manager(MockDriver::healthy());

        let mut handle = manager.connect().await.expect("connects");
        assert!(!manager.has_broken(&mut handle));
        manager.is_valid(&mut handle).await.expect("live handle");
    }

    #[tokio::test]
    async fn test_manager_surfaces_classified_errors() {
        let manager = manager(MockDriver::healthy().fail_open(DriverError::new(
            "ECONNREFUSED",
            "connect ECONNREFUSED 127.0.0.1:1433",
        )));

        let err = manager.connect().await.expect_err("refused");
        assert!(matches!(err, ConnectionError::ConnectionRefused { .. }));
    }

    #[tokio::test]
    async fn test_manager_reports_broken_after_close() {
        let manager = manager(MockDriver::healthy());
        let mut handle = manager.connect().await.expect("connects");

        handle.close().await;
        assert!(manager.has_broken(&mut handle));
        assert!(manager.is_valid(&mut handle).await.is_err());
    }

    #[tokio::test]
    async fn test_pool_checkout_goes_through_the_adapter() {
        let pool = Pool::builder()
            .max_size(2)
            .build(manager(MockDriver::healthy()))
            .await
            .expect("pool builds");

        let handle = pool.get().await.expect("checkout");
        assert!(handle.is_validated());
    }
}
