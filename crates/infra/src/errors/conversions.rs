//! Conversions from external infrastructure errors into gateway errors.
//!
//! The taxonomy is closed, so every storage failure surfaces as
//! `REMOTE_FAILURE` tagged with `details.source`.

use graphgate_domain::{ErrorKind, GatewayError};
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

pub const CREDENTIAL_STORE_SOURCE: &str = "credential_store";

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GatewayError);

impl From<InfraError> for GatewayError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GatewayError> for InfraError {
    fn from(value: GatewayError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoGatewayError {
    fn into_gateway(self) -> GatewayError;
}

fn store_failure(message: impl Into<String>) -> GatewayError {
    GatewayError::remote(message).with_detail("source", CREDENTIAL_STORE_SOURCE)
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → GatewayError */
/* -------------------------------------------------------------------------- */

impl IntoGatewayError for SqlError {
    fn into_gateway(self) -> GatewayError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => store_failure("database is busy"),
                    ErrorCode::DatabaseLocked => store_failure("database is locked"),
                    ErrorCode::ConstraintViolation => {
                        store_failure(format!("constraint violation: {message}"))
                    }
                    _ => store_failure(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => store_failure("no rows returned by query"),
            RE::FromSqlConversionFailure(_, _, cause) => {
                store_failure(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => store_failure(format!("invalid column type: {ty}")),
            RE::InvalidPath(path) => {
                store_failure(format!("invalid database path: {}", path.to_string_lossy()))
            }
            other => store_failure(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_gateway())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → GatewayError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(store_failure(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → GatewayError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(store_failure(format!("stored JSON column is malformed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → GatewayError */
/* -------------------------------------------------------------------------- */

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        let message = if value.is_cancelled() {
            "blocking task was cancelled".to_string()
        } else {
            format!("blocking task panicked: {value}")
        };
        InfraError(GatewayError::new(ErrorKind::RemoteFailure, message))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GatewayError */
/* -------------------------------------------------------------------------- */

impl IntoGatewayError for HttpError {
    fn into_gateway(self) -> GatewayError {
        let error = GatewayError::remote("HTTP request failed").with_detail("error", self.to_string());

        if self.is_timeout() {
            return error.with_detail("timeout", true);
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return error.with_detail("connect", true);
        }

        error
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_gateway())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
