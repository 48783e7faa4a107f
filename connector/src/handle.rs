use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use crate::driver::Driver;

/// A live, probed connection plus the driver binding that created it.
///
/// Handles are only constructed after a successful liveness probe, so a
/// handle observable outside this crate is always in the validated state
/// until it is closed. Closing is terminal; a closed handle is never reused.
pub struct ConnectionHandle<D: Driver> {
    conn: Mutex<Option<D::Connection>>,
    driver: Arc<D>,
    validated: AtomicBool,
}

impl<D: Driver> ConnectionHandle<D> {
    pub(crate) fn validated(conn: D::Connection, driver: Arc<D>) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
            driver,
            validated: AtomicBool::new(true),
        }
    }

    /// Whether this handle passed its liveness probe and has not been closed.
    ///
    /// Pure flag read, no I/O and no locking: a handle whose network peer has
    /// silently gone away still reports true here. Staleness is the pool's
    /// concern; it must evict on query failure.
    pub fn is_validated(&self) -> bool {
        self.validated.load(Ordering::SeqCst)
    }

    /// Close the underlying driver resource. Idempotent: the flag drops
    /// first, the resource is taken out exactly once, and a second call
    /// finds nothing left to do.
    pub async fn close(&self) {
        self.validated.store(false, Ordering::SeqCst);
        let conn = self.conn.lock().await.take();
        if let Some(conn) = conn {
            self.driver.close(conn).await;
        }
    }

    pub(crate) async fn conn(&self) -> MutexGuard<'_, Option<D::Connection>> {
        self.conn.lock().await
    }
}

impl<D: Driver> fmt::Debug for ConnectionHandle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("validated", &self.is_validated())
            .finish_non_exhaustive()
    }
}
