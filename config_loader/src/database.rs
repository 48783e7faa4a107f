use serde::{Deserialize, Serialize};

/// Connection settings for a single SQL Server target.
///
/// `port` is left unresolved here: the connector applies the dialect
/// default (1433) only when no explicit value was configured.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[non_exhaustive]
pub struct MssqlConfig {
    pub host: String,
    pub database: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pool_size: Option<u32>,
    pub min_idle: Option<u32>,
    /// Pool checkout timeout in seconds.
    pub connection_timeout: Option<u32>,
    pub dialect_options: Option<MssqlDialectOptions>,
}

impl MssqlConfig {
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            port: None,
            username: None,
            password: None,
            pool_size: None,
            min_idle: None,
            connection_timeout: None,
            dialect_options: None,
        }
    }
}

/// Driver-specific overrides carried alongside the structured settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[non_exhaustive]
pub struct MssqlDialectOptions {
    /// Raw ADO.NET connection string. When present it is handed to the
    /// driver verbatim and the structured host/database fields are ignored.
    pub connection_string: Option<String>,
    pub encrypt: Option<bool>,
    pub trust_server_certificate: Option<bool>,
}
