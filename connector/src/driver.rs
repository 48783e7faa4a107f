use async_trait::async_trait;

use crate::descriptor::ConnectionDescriptor;
use crate::error::DriverError;
use crate::types::{SqlValue, TypeParserRegistry};

/// Boundary to a native driver binding.
///
/// The adapter needs exactly three things from a driver: a way to construct
/// a connection-capable resource from a descriptor, a way to execute a
/// trivial probe statement against it, and a best-effort teardown. All
/// failures surface as [`DriverError`] so they can be classified uniformly.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Open a transport-level connection. A successful open does not imply
    /// the session can run queries; callers follow up with [`Driver::probe`].
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Self::Connection, DriverError>;

    /// Execute a trivial statement and decode the first row through the
    /// parser registry. Custom parsers registered at call time apply; parsers
    /// registered later affect only subsequent probes.
    async fn probe(
        &self,
        conn: &mut Self::Connection,
        statement: &str,
        parsers: &TypeParserRegistry,
    ) -> Result<Vec<SqlValue>, DriverError>;

    /// Release the underlying resource. Failures are discarded; by the time
    /// close is called the connection is already unusable.
    async fn close(&self, conn: Self::Connection);
}
