use std::borrow::Cow;

use thiserror::Error;

/// Raw failure shape reported by a driver binding: an optional vendor code,
/// a message, and the underlying error when one exists.
///
/// Vendor codes are string-based and unstable across driver releases, so
/// everything downstream treats them as best-effort classification input and
/// keeps the original error attached for diagnostics.
#[derive(Debug, Error)]
#[error("{message}")]
#[non_exhaustive]
pub struct DriverError {
    pub code: Option<Cow<'static, str>>,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DriverError {
    /// A driver error carrying a vendor code.
    pub fn new(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            source: None,
        }
    }

    /// A driver error with no code at all. Always classifies as [`ConnectionError::Generic`].
    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

/// Closed enumeration over the vendor codes the classifier recognizes.
///
/// `ESOCKET` is overloaded by the driver for several distinct network
/// failures and needs a second look at the message; every other code maps
/// directly to one classified kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorCode {
    Esocket,
    Econnrefused,
    AccessDenied,
    Enotfound,
    Ehostunreach,
    Einval,
    Unrecognized,
}

impl DriverErrorCode {
    /// Vendor codes are literal and case-sensitive; anything unknown lands in
    /// `Unrecognized` rather than falling through silently.
    pub fn parse(code: &str) -> Self {
        match code {
            "ESOCKET" => Self::Esocket,
            "ECONNREFUSED" => Self::Econnrefused,
            "ELOGIN" | "ER_ACCESS_DENIED_ERROR" => Self::AccessDenied,
            "ENOTFOUND" => Self::Enotfound,
            "EHOSTUNREACH" => Self::Ehostunreach,
            "EINVAL" => Self::Einval,
            _ => Self::Unrecognized,
        }
    }
}

/// Connection failure classified into a stable, backend-agnostic taxonomy.
///
/// Each variant wraps the original [`DriverError`] so callers can log the
/// vendor-specific detail without depending on it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// The host exists but is not reachable from this network.
    #[error("host not reachable")]
    HostNotReachable {
        #[source]
        source: DriverError,
    },

    /// The server actively refused the connection.
    #[error("connection refused")]
    ConnectionRefused {
        #[source]
        source: DriverError,
    },

    /// The hostname did not resolve.
    #[error("host not found")]
    HostNotFound {
        #[source]
        source: DriverError,
    },

    /// The server rejected the credentials.
    #[error("access denied")]
    AccessDenied {
        #[source]
        source: DriverError,
    },

    /// The connection request itself was malformed.
    #[error("invalid connection")]
    InvalidConnection {
        #[source]
        source: DriverError,
    },

    /// Invalid configuration; the driver was never reached.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: Cow<'static, str> },

    /// Connection failed with no more specific classification.
    #[error("connection error")]
    Generic {
        #[source]
        source: DriverError,
    },
}

impl ConnectionError {
    /// Create an invalid config error.
    pub fn invalid_config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// The original driver error, when this classification wraps one.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::HostNotReachable { source }
            | Self::ConnectionRefused { source }
            | Self::HostNotFound { source }
            | Self::AccessDenied { source }
            | Self::InvalidConnection { source }
            | Self::Generic { source } => Some(source),
            Self::InvalidConfig { .. } => None,
        }
    }
}

impl From<DriverError> for ConnectionError {
    fn from(err: DriverError) -> Self {
        let code = match err.code() {
            Some(code) => DriverErrorCode::parse(code),
            None => return Self::Generic { source: err },
        };

        match code {
            DriverErrorCode::Esocket => {
                if err.message.contains("EHOSTUNREACH") {
                    Self::HostNotReachable { source: err }
                } else if err.message.contains("ECONNREFUSED") {
                    Self::ConnectionRefused { source: err }
                } else {
                    Self::Generic { source: err }
                }
            }
            DriverErrorCode::Econnrefused => Self::ConnectionRefused { source: err },
            DriverErrorCode::AccessDenied => Self::AccessDenied { source: err },
            DriverErrorCode::Enotfound => Self::HostNotFound { source: err },
            DriverErrorCode::Ehostunreach => Self::HostNotReachable { source: err },
            DriverErrorCode::Einval => Self::InvalidConnection { source: err },
            DriverErrorCode::Unrecognized => Self::Generic { source: err },
        }
    }
}
