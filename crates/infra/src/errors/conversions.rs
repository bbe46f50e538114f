//! Conversions from external infrastructure errors into domain errors.

use cellarsync_domain::CellarSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CellarSyncError);

impl From<InfraError> for CellarSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CellarSyncError> for InfraError {
    fn from(value: CellarSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCellarSyncError {
    fn into_cellarsync(self) -> CellarSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CellarSyncError */
/* -------------------------------------------------------------------------- */

impl IntoCellarSyncError for SqlError {
    fn into_cellarsync(self) -> CellarSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        CellarSyncError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        CellarSyncError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 1555 | 2067) => {
                        CellarSyncError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ReadOnly, _) => {
                        CellarSyncError::Database("database is read-only".into())
                    }
                    _ => CellarSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => CellarSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                CellarSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                CellarSyncError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidPath(path) => CellarSyncError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => CellarSyncError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_cellarsync())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → CellarSyncError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(CellarSyncError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → CellarSyncError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(CellarSyncError::Database(format!("stored JSON is malformed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CellarSyncError */
/* -------------------------------------------------------------------------- */

impl IntoCellarSyncError for HttpError {
    fn into_cellarsync(self) -> CellarSyncError {
        if self.is_timeout() {
            return CellarSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CellarSyncError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => CellarSyncError::Auth(message),
                404 => CellarSyncError::NotFound(message),
                429 => CellarSyncError::Network(message),
                400..=499 => CellarSyncError::InvalidInput(message),
                _ => CellarSyncError::Network(message),
            };
        }

        if self.is_decode() {
            return CellarSyncError::UpstreamShape(format!("response body is not JSON: {self}"));
        }

        CellarSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_cellarsync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
