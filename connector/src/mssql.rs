use std::borrow::Cow;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tiberius::error::{Error as TiberiusError, IoErrorKind};
use tiberius::{Client, ColumnData, Config, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::adapter::MssqlAdapter;
use crate::descriptor::ConnectionDescriptor;
use crate::driver::Driver;
use crate::error::DriverError;
use crate::handle::ConnectionHandle;
use crate::types::{SqlType, SqlValue, TypeParserRegistry};

pub type MssqlClient = Client<Compat<TcpStream>>;
pub type MssqlHandle = ConnectionHandle<TiberiusDriver>;

/// SQL Server login failure (`Login failed for user ...`).
const LOGIN_FAILED: u32 = 18456;

/// SQL Server driver binding backed by tiberius.
#[derive(Debug, Default, Clone, Copy)]
pub struct TiberiusDriver;

impl TiberiusDriver {
    /// Adapter wired to this driver, the usual entry point.
    pub fn adapter() -> MssqlAdapter<TiberiusDriver> {
        MssqlAdapter::new(TiberiusDriver)
    }
}

#[async_trait]
impl Driver for TiberiusDriver {
    type Connection = MssqlClient;

    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<MssqlClient, DriverError> {
        let config =
            Config::from_ado_string(&descriptor.connection_string).map_err(tiberius_error)?;

        let tcp = TcpStream::connect(config.get_addr()).await.map_err(io_error)?;
        tcp.set_nodelay(true).map_err(io_error)?;

        Client::connect(config, tcp.compat_write())
            .await
            .map_err(tiberius_error)
    }

    async fn probe(
        &self,
        conn: &mut MssqlClient,
        statement: &str,
        parsers: &TypeParserRegistry,
    ) -> Result<Vec<SqlValue>, DriverError> {
        let stream = conn.simple_query(statement).await.map_err(tiberius_error)?;
        let row = stream.into_row().await.map_err(tiberius_error)?;

        Ok(row
            .map(|row| {
                row.into_iter()
                    .map(|data| decode_column(data, parsers))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn close(&self, conn: MssqlClient) {
        // orderly shutdown; by this point any failure is uninteresting
        let _ = conn.close().await;
    }
}

/// Decode one result cell, preferring a registered custom parser over the
/// built-in conversion. NULLs bypass custom parsers.
fn decode_column(data: ColumnData<'static>, parsers: &TypeParserRegistry) -> SqlValue {
    if let Some(parser) = parsers.parser_for(sql_type_of(&data)) {
        if let Some(text) = raw_text(&data) {
            return parser(&text);
        }
    }

    convert(data)
}

fn sql_type_of(data: &ColumnData<'_>) -> SqlType {
    match data {
        ColumnData::Bit(_) => SqlType::Bit,
        ColumnData::U8(_) | ColumnData::I16(_) | ColumnData::I32(_) | ColumnData::I64(_) => {
            SqlType::Int
        }
        ColumnData::F32(_) | ColumnData::F64(_) => SqlType::Float,
        ColumnData::Numeric(_) => SqlType::Decimal,
        ColumnData::String(_) => SqlType::String,
        ColumnData::Binary(_) => SqlType::Binary,
        ColumnData::Guid(_) => SqlType::Guid,
        ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)
        | ColumnData::Date(_)
        | ColumnData::Time(_)
        | ColumnData::DateTimeOffset(_) => SqlType::DateTime,
        _ => SqlType::Other,
    }
}

/// Textual form of a raw cell, the input custom parsers operate on. Binary
/// and temporal cells have no canonical text and skip custom parsing.
fn raw_text(data: &ColumnData<'_>) -> Option<String> {
    match data {
        ColumnData::Bit(Some(value)) => Some(value.to_string()),
        ColumnData::U8(Some(value)) => Some(value.to_string()),
        ColumnData::I16(Some(value)) => Some(value.to_string()),
        ColumnData::I32(Some(value)) => Some(value.to_string()),
        ColumnData::I64(Some(value)) => Some(value.to_string()),
        ColumnData::F32(Some(value)) => Some(value.to_string()),
        ColumnData::F64(Some(value)) => Some(value.to_string()),
        ColumnData::Numeric(Some(value)) => Some(numeric_to_f64(value).to_string()),
        ColumnData::String(Some(value)) => Some(value.to_string()),
        ColumnData::Guid(Some(value)) => Some(value.to_string()),
        _ => None,
    }
}

fn convert(data: ColumnData<'static>) -> SqlValue {
    match data {
        ColumnData::Bit(value) => value.map(SqlValue::Bool).unwrap_or(SqlValue::Null),
        ColumnData::U8(value) => value
            .map(|v| SqlValue::Int(i64::from(v)))
            .unwrap_or(SqlValue::Null),
        ColumnData::I16(value) => value
            .map(|v| SqlValue::Int(i64::from(v)))
            .unwrap_or(SqlValue::Null),
        ColumnData::I32(value) => value
            .map(|v| SqlValue::Int(i64::from(v)))
            .unwrap_or(SqlValue::Null),
        ColumnData::I64(value) => value.map(SqlValue::Int).unwrap_or(SqlValue::Null),
        ColumnData::F32(value) => value
            .map(|v| SqlValue::Float(f64::from(v)))
            .unwrap_or(SqlValue::Null),
        ColumnData::F64(value) => value.map(SqlValue::Float).unwrap_or(SqlValue::Null),
        ColumnData::Numeric(value) => value
            .map(|n| SqlValue::Float(numeric_to_f64(&n)))
            .unwrap_or(SqlValue::Null),
        ColumnData::String(value) => value
            .map(|s| SqlValue::String(s.into_owned()))
            .unwrap_or(SqlValue::Null),
        ColumnData::Binary(value) => value
            .map(|b| SqlValue::Bytes(b.into_owned()))
            .unwrap_or(SqlValue::Null),
        ColumnData::Guid(value) => value
            .map(|g| SqlValue::String(g.to_string()))
            .unwrap_or(SqlValue::Null),
        data @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => match NaiveDateTime::from_sql(&data) {
            Ok(Some(datetime)) => SqlValue::DateTime(datetime),
            _ => SqlValue::Null,
        },
        data @ ColumnData::Date(_) => match chrono::NaiveDate::from_sql(&data) {
            Ok(Some(date)) => date
                .and_hms_opt(0, 0, 0)
                .map(SqlValue::DateTime)
                .unwrap_or(SqlValue::Null),
            _ => SqlValue::Null,
        },
        data @ ColumnData::DateTimeOffset(_) => {
            match chrono::DateTime::<chrono::Utc>::from_sql(&data) {
                Ok(Some(datetime)) => SqlValue::DateTime(datetime.naive_utc()),
                _ => SqlValue::Null,
            }
        }
        // time-of-day and xml cells have no SqlValue shape
        _ => SqlValue::Null,
    }
}

fn numeric_to_f64(value: &tiberius::numeric::Numeric) -> f64 {
    value.value() as f64 / 10f64.powi(i32::from(value.scale()))
}

/// Map a tiberius failure into the code/message shape the classifier
/// consumes, keeping the original error attached.
fn tiberius_error(err: TiberiusError) -> DriverError {
    let (code, message) = match &err {
        TiberiusError::Io { kind, message } => (io_kind_code(kind), message.clone()),
        TiberiusError::Server(token) if token.code() == LOGIN_FAILED => {
            (Some(Cow::Borrowed("ELOGIN")), token.message().to_owned())
        }
        TiberiusError::Server(token) => (
            None,
            format!("server error {}: {}", token.code(), token.message()),
        ),
        other => (None, other.to_string()),
    };

    DriverError {
        code,
        message,
        source: Some(Box::new(err)),
    }
}

fn io_kind_code(kind: &IoErrorKind) -> Option<Cow<'static, str>> {
    let code = match kind {
        IoErrorKind::ConnectionRefused => "ECONNREFUSED",
        IoErrorKind::NotFound => "ENOTFOUND",
        IoErrorKind::InvalidInput => "EINVAL",
        IoErrorKind::TimedOut => "ETIMEDOUT",
        _ => return None,
    };

    Some(Cow::Borrowed(code))
}

fn io_error(err: std::io::Error) -> DriverError {
    let message = err.to_string();
    let code = match err.kind() {
        std::io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
        std::io::ErrorKind::HostUnreachable => Some("EHOSTUNREACH"),
        std::io::ErrorKind::NotFound => Some("ENOTFOUND"),
        std::io::ErrorKind::InvalidInput => Some("EINVAL"),
        std::io::ErrorKind::TimedOut => Some("ETIMEDOUT"),
        // getaddrinfo failures surface without a stable kind
        _ if message.contains("failed to lookup address") => Some("ENOTFOUND"),
        _ => None,
    };

    DriverError {
        code: code.map(Cow::Borrowed),
        message,
        source: Some(Box::new(err)),
    }
}
