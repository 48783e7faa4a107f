pub mod adapter;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod handle;
#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "mssql")]
pub mod pool;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{ConnectionAdapter, MssqlAdapter};
pub use error::{ConnectionError, DriverError};
pub use handle::ConnectionHandle;

pub type ConnectionResult<T> = Result<T, ConnectionError>;
