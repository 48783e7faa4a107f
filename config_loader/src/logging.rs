use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings consumed by the `logger` crate when installing the global
/// subscriber.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[non_exhaustive]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `connector=debug,info`. Falls back
    /// to `RUST_LOG`, then `info`, when unset.
    pub level: Option<String>,
    pub format: Option<LogFormat>,
    /// Directory for rolling log files. Logs go to stdout when unset.
    pub directory: Option<PathBuf>,
    pub file_prefix: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}
