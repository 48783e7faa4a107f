use config_loader::database::MssqlConfig;

use crate::error::ConnectionError;

/// Port used when the configuration does not set one.
pub const DEFAULT_PORT: u16 = 1433;

/// Statement issued to confirm a freshly opened session is query-capable.
/// Opening the transport alone does not guarantee that.
pub const PROBE_STATEMENT: &str = "SELECT 1";

/// A resolved, driver-native connection request.
///
/// Built once per `connect` call and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub database: String,
    /// ADO.NET-format connection string handed to the driver.
    pub connection_string: String,
    pub probe: &'static str,
}

impl ConnectionDescriptor {
    /// Resolve a configuration into a driver-native descriptor.
    ///
    /// A raw `dialect_options.connection_string` wins verbatim over the
    /// structured fields. The default port applies only when the
    /// configuration leaves it unset; an explicit value is never overwritten.
    pub fn resolve(config: &MssqlConfig) -> Result<Self, ConnectionError> {
        let port = config.port.unwrap_or(DEFAULT_PORT);

        if let Some(raw) = config
            .dialect_options
            .as_ref()
            .and_then(|options| options.connection_string.as_deref())
        {
            return Ok(Self {
                host: config.host.clone(),
                port,
                database: config.database.clone(),
                connection_string: raw.to_owned(),
                probe: PROBE_STATEMENT,
            });
        }

        if config.host.trim().is_empty() {
            return Err(ConnectionError::invalid_config("host must not be empty"));
        }

        let mut connection_string = format!(
            "Data Source={},{};Initial Catalog={}",
            config.host, port, config.database
        );

        match (&config.username, &config.password) {
            (Some(username), password) => {
                connection_string.push_str(&format!(";User ID={username}"));
                if let Some(password) = password {
                    connection_string.push_str(&format!(";Password={password}"));
                }
            }
            (None, _) => connection_string.push_str(";Integrated Security=true"),
        }

        if let Some(options) = &config.dialect_options {
            if let Some(encrypt) = options.encrypt {
                connection_string.push_str(&format!(";Encrypt={encrypt}"));
            }
            if let Some(trust) = options.trust_server_certificate {
                connection_string.push_str(&format!(";TrustServerCertificate={trust}"));
            }
        }

        Ok(Self {
            host: config.host.clone(),
            port,
            database: config.database.clone(),
            connection_string,
            probe: PROBE_STATEMENT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::database::MssqlDialectOptions;

    fn base_config() -> MssqlConfig {
        MssqlConfig::new("db.internal", "orders")
    }

    #[test]
    fn test_port_defaults_to_1433_when_unset() {
        let descriptor = ConnectionDescriptor::resolve(&base_config()).expect("resolves");
        assert_eq!(descriptor.port, DEFAULT_PORT);
        assert!(descriptor.connection_string.contains("db.internal,1433"));
    }

    #[test]
    fn test_explicit_port_is_preserved() {
        let mut config = base_config();
        config.port = Some(14330);

        let descriptor = ConnectionDescriptor::resolve(&config).expect("resolves");
        assert_eq!(descriptor.port, 14330);
        assert!(descriptor.connection_string.contains("db.internal,14330"));
    }

    #[test]
    fn test_raw_connection_string_wins_verbatim() {
        let raw = "Data Source=elsewhere;Initial Catalog=other;Integrated Security=true";

        let mut options = MssqlDialectOptions::default();
        options.connection_string = Some(raw.to_owned());

        let mut config = base_config();
        config.port = Some(9999);
        config.dialect_options = Some(options);

        let descriptor = ConnectionDescriptor::resolve(&config).expect("resolves");
        assert_eq!(descriptor.connection_string, raw);
        // structured fields still resolve for diagnostics
        assert_eq!(descriptor.host, "db.internal");
        assert_eq!(descriptor.port, 9999);
    }

    #[test]
    fn test_raw_connection_string_skips_host_validation() {
        let mut options = MssqlDialectOptions::default();
        options.connection_string = Some("Server=tcp:db,1433;Database=x".to_owned());

        let mut config = MssqlConfig::new("", "");
        config.dialect_options = Some(options);

        assert!(ConnectionDescriptor::resolve(&config).is_ok());
    }

    #[test]
    fn test_synthesized_integrated_security_string() {
        let descriptor = ConnectionDescriptor::resolve(&base_config()).expect("resolves");
        assert_eq!(
            descriptor.connection_string,
            "Data Source=db.internal,1433;Initial Catalog=orders;Integrated Security=true"
        );
        assert_eq!(descriptor.probe, "SELECT 1");
    }

    #[test]
    fn test_synthesized_sql_auth_string() {
        let mut config = base_config();
        config.username = Some("app_user".to_owned());
        config.password = Some("s3cret".to_owned());

        let descriptor = ConnectionDescriptor::resolve(&config).expect("resolves");
        assert!(descriptor.connection_string.contains("User ID=app_user"));
        assert!(descriptor.connection_string.contains("Password=s3cret"));
        assert!(!descriptor.connection_string.contains("Integrated Security"));
    }

    #[test]
    fn test_dialect_flags_are_appended() {
        let mut options = MssqlDialectOptions::default();
        options.encrypt = Some(true);
        options.trust_server_certificate = Some(true);

        let mut config = base_config();
        config.dialect_options = Some(options);

        let descriptor = ConnectionDescriptor::resolve(&config).expect("resolves");
        assert!(descriptor.connection_string.contains("Encrypt=true"));
        assert!(
            descriptor
                .connection_string
                .contains("TrustServerCertificate=true")
        );
    }

    #[test]
    fn test_empty_host_is_rejected() {
        let config = MssqlConfig::new("  ", "orders");
        let err = ConnectionDescriptor::resolve(&config).expect_err("must fail");
        assert!(matches!(err, ConnectionError::InvalidConfig { .. }));
    }
}
