use std::sync::Arc;

use async_trait::async_trait;
use config_loader::database::MssqlConfig;

use crate::ConnectionResult;
use crate::descriptor::{ConnectionDescriptor, PROBE_STATEMENT};
use crate::driver::Driver;
use crate::error::{ConnectionError, DriverError};
use crate::handle::ConnectionHandle;
use crate::types::{SqlType, SqlValue, TypeParserRegistry};

/// Dialect-agnostic connection lifecycle contract.
///
/// Pool managers depend on this abstractly and get one concrete
/// implementation per backend injected at construction time.
#[async_trait]
pub trait ConnectionAdapter: Send + Sync {
    type Config;
    type Handle;

    /// Open, probe, and return a validated connection. Suspends until the
    /// driver responds and resolves exactly once, with either a handle or a
    /// classified error. No retry happens here; retry and backoff policy
    /// belong to the pool.
    async fn connect(&self, config: &Self::Config) -> ConnectionResult<Self::Handle>;

    /// Pure predicate over adapter-owned state; performs no I/O.
    fn validate(&self, handle: &Self::Handle) -> bool;

    /// Best-effort teardown. Idempotent and silent; a failure to close is
    /// the caller's to log if it cares.
    async fn disconnect(&self, handle: &Self::Handle);
}

/// SQL Server implementation of [`ConnectionAdapter`], generic over the
/// driver binding so the lifecycle can be exercised without a server.
///
/// Holds no per-connection state. The only thing shared across `connect`
/// calls is the type-parser registry, which is its own concurrency story.
pub struct MssqlAdapter<D: Driver> {
    driver: Arc<D>,
    parsers: Arc<TypeParserRegistry>,
}

impl<D: Driver> MssqlAdapter<D> {
    pub fn new(driver: D) -> Self {
        Self::with_parsers(driver, Arc::new(TypeParserRegistry::new()))
    }

    pub fn with_parsers(driver: D, parsers: Arc<TypeParserRegistry>) -> Self {
        Self {
            driver: Arc::new(driver),
            parsers,
        }
    }

    /// Install or replace the result parser for one column family. Exposed
    /// so callers can re-register parsing after defining custom types.
    pub fn refresh_type_parser<F>(&self, sql_type: SqlType, parser: F)
    where
        F: Fn(&str) -> SqlValue + Send + Sync + 'static,
    {
        self.parsers.refresh(sql_type, parser);
    }

    pub fn clear_type_parsers(&self) {
        self.parsers.clear();
    }

    pub fn type_parsers(&self) -> &Arc<TypeParserRegistry> {
        &self.parsers
    }

    /// Re-probe an open connection. Used by pool health hooks; unlike
    /// [`ConnectionAdapter::validate`] this does real I/O.
    pub async fn ping(&self, handle: &ConnectionHandle<D>) -> ConnectionResult<()> {
        let mut conn = handle.conn().await;
        match conn.as_mut() {
            Some(conn) => self
                .driver
                .probe(conn, PROBE_STATEMENT, &self.parsers)
                .await
                .map(drop)
                .map_err(ConnectionError::from),
            None => Err(ConnectionError::Generic {
                source: DriverError::uncoded("connection already closed"),
            }),
        }
    }

    pub(crate) fn driver(&self) -> &Arc<D> {
        &self.driver
    }
}

#[async_trait]
impl<D: Driver> ConnectionAdapter for MssqlAdapter<D> {
    type Config = MssqlConfig;
    type Handle = ConnectionHandle<D>;

    async fn connect(&self, config: &MssqlConfig) -> ConnectionResult<ConnectionHandle<D>> {
        let descriptor = ConnectionDescriptor::resolve(config)?;

        tracing::debug!(
            host = %descriptor.host,
            port = descriptor.port,
            database = %descriptor.database,
            "connecting to sql server"
        );

        let mut conn = self.driver.open(&descriptor).await?;

        // the transport is up, but only a round trip proves the session can
        // run queries
        if let Err(err) = self
            .driver
            .probe(&mut conn, descriptor.probe, &self.parsers)
            .await
        {
            self.driver.close(conn).await;
            return Err(err.into());
        }

        Ok(ConnectionHandle::validated(conn, Arc::clone(&self.driver)))
    }

    fn validate(&self, handle: &ConnectionHandle<D>) -> bool {
        handle.is_validated()
    }

    async fn disconnect(&self, handle: &ConnectionHandle<D>) {
        handle.close().await;
    }
}
