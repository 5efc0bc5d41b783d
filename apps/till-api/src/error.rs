//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Till API                               │
//! │                                                                         │
//! │  Handler -> Result<Json<T>, ApiError>                                   │
//! │                                                                         │
//! │  ValidationError ─┐                                                     │
//! │  CoreError ───────┼──► DbError ──► ApiError ──► (status, JSON body)    │
//! │  sqlx::Error ─────┘                                                     │
//! │                                                                         │
//! │  Body:  { "code": "PRODUCT_UNAVAILABLE",                                │
//! │           "message": "Product not found: 9f1c…" }                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use till_core::CoreError;
use till_db::DbError;

/// Error body returned by every failing request.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Sale not found: 3b0e…"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Machine-readable error codes, one HTTP status each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request: bad JSON, bad query string (400)
    BadRequest,

    /// A cart line names a product that is missing or inactive (400)
    ProductUnavailable,

    /// Missing, malformed or expired bearer token (401)
    Unauthorized,

    /// Authenticated, but the role lacks the permission (403)
    Forbidden,

    /// Resource not found in the caller's tenant (404)
    NotFound,

    /// SKU, barcode or category name already taken (409)
    Duplicate,

    /// Sale gave up after repeated write conflicts; safe to retry (409)
    Conflict,

    /// Input failed validation (422)
    ValidationError,

    /// A business rule rejected the request: discounts, cash tendered (422)
    BusinessRule,

    /// A referenced category or user does not exist (422)
    InvalidReference,

    /// The database is momentarily locked; safe to retry (503)
    Busy,

    /// Stock projection diverged from its ledger (500)
    ConsistencyFault,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest | ErrorCode::ProductUnavailable => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Duplicate | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ValidationError | ErrorCode::BusinessRule | ErrorCode::InvalidReference => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ConsistencyFault | ErrorCode::DatabaseError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Conversions
// =============================================================================

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::InvalidReference, "Invalid reference")
            }
            DbError::Busy(msg) => {
                tracing::warn!("Database busy: {}", msg);
                ApiError::new(ErrorCode::Busy, "Database is busy, try again")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::Busy, "Database pool exhausted, try again")
            }
            err @ DbError::Conflict { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            DbError::Domain(core) => ApiError::from(core),
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) | CoreError::ProductInactive { .. } => {
                ApiError::new(ErrorCode::ProductUnavailable, err.to_string())
            }
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            CoreError::CategoryNotFound(_) => {
                ApiError::new(ErrorCode::InvalidReference, err.to_string())
            }
            CoreError::LineDiscountTooLarge { .. }
            | CoreError::SaleDiscountTooLarge { .. }
            | CoreError::InsufficientCash { .. }
            | CoreError::AmountOverflow { .. } => {
                ApiError::new(ErrorCode::BusinessRule, err.to_string())
            }
            CoreError::ConsistencyFault { .. } => {
                error!("{}", err);
                ApiError::new(ErrorCode::ConsistencyFault, err.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::validation(e.body_text()),
            other => ApiError::new(ErrorCode::BadRequest, other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(ErrorCode::BadRequest, rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::ValidationError;

    #[test]
    fn test_product_errors_are_bad_requests() {
        let err = ApiError::from(DbError::Domain(CoreError::ProductNotFound("p-1".into())));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message.contains("p-1"));

        let err = ApiError::from(CoreError::ProductInactive {
            id: "p-2".into(),
            name: "Old Stock".into(),
        });
        assert_eq!(err.code, ErrorCode::ProductUnavailable);
        assert!(err.message.contains("Old Stock"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (DbError::not_found("Sale", "s-1"), StatusCode::NOT_FOUND),
            (DbError::duplicate("sku", "COKE"), StatusCode::CONFLICT),
            (DbError::Conflict { attempts: 5 }, StatusCode::CONFLICT),
            (DbError::Busy("locked".into()), StatusCode::SERVICE_UNAVAILABLE),
            (DbError::QueryFailed("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                DbError::Domain(CoreError::InsufficientCash {
                    received: "1.00".into(),
                    total: "2.00".into(),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                DbError::Domain(CoreError::Validation(ValidationError::Required {
                    field: "items".into(),
                })),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let err = ApiError::from(DbError::QueryFailed("no such column: secret".into()));
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Sale", "s-9")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Sale not found: s-9");
    }
}
