// Error types for the booth pricing engine
// Every variant carries a stable machine-readable code for API clients

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for pricing and catalog operations
///
/// The first three variants are the refusals a quote can end in; the rest
/// cover lookups, rule/package management and infrastructure faults.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Booth area is missing or not strictly positive (individual mode)
    #[error("Booth size must be greater than zero")]
    InvalidBoothSize,

    /// Price per square metre is missing or not strictly positive
    #[error("Price per square metre must be greater than zero")]
    InvalidPrice,

    /// Monetary result does not fit the decimal range
    #[error("{0} is out of the supported range")]
    AmountOutOfRange(&'static str),

    #[error("Exhibition not found: {0}")]
    ExhibitionNotFound(i32),

    #[error("Package not found: {0}")]
    PackageNotFound(Uuid),

    #[error("Equipment not found: {0}")]
    EquipmentNotFound(i32),

    #[error("Pricing rule not found: {0}")]
    RuleNotFound(Uuid),

    /// Rule definition fails its consistency checks
    #[error("Invalid pricing rule: {0}")]
    InvalidPricingRule(String),

    /// Package definition fails its consistency checks
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// Request shape validation (missing fields, out-of-range quantities)
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result type alias for pricing operations
pub type EngineResult<T> = Result<T, PricingError>;

/// JSON body of every error response
///
/// Carries no numeric pricing fields, so a refused quote can never be
/// mistaken for a partial one.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "INVALID_BOOTH_SIZE")
    pub error: String,

    /// Human-readable message
    pub message: String,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl PricingError {
    /// Stable error code exposed to API clients
    pub fn code(&self) -> &'static str {
        match self {
            PricingError::InvalidBoothSize => "INVALID_BOOTH_SIZE",
            PricingError::InvalidPrice => "INVALID_PRICE",
            PricingError::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            PricingError::ExhibitionNotFound(_) => "EXHIBITION_NOT_FOUND",
            PricingError::PackageNotFound(_) => "PACKAGE_NOT_FOUND",
            PricingError::EquipmentNotFound(_) => "EQUIPMENT_NOT_FOUND",
            PricingError::RuleNotFound(_) => "RULE_NOT_FOUND",
            PricingError::InvalidPricingRule(_) => "INVALID_PRICING_RULE",
            PricingError::InvalidPackage(_) => "INVALID_PACKAGE",
            PricingError::ValidationError(_) => "VALIDATION_ERROR",
            PricingError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            PricingError::InvalidBoothSize
            | PricingError::InvalidPrice
            | PricingError::AmountOutOfRange(_)
            | PricingError::InvalidPricingRule(_)
            | PricingError::InvalidPackage(_)
            | PricingError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PricingError::ExhibitionNotFound(_)
            | PricingError::PackageNotFound(_)
            | PricingError::EquipmentNotFound(_)
            | PricingError::RuleNotFound(_) => StatusCode::NOT_FOUND,
            PricingError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is a refusal to quote rather than a fault
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            PricingError::InvalidBoothSize
                | PricingError::InvalidPrice
                | PricingError::AmountOutOfRange(_)
        )
    }

    fn to_error_response(&self) -> ErrorResponse {
        let message = match self {
            PricingError::DatabaseError(e) => {
                // Full error stays in the logs
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            other => {
                tracing::debug!("Pricing request rejected: {}", other);
                other.to_string()
            }
        };

        ErrorResponse {
            error: self.code().to_string(),
            message,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl From<validator::ValidationErrors> for PricingError {
    fn from(err: validator::ValidationErrors) -> Self {
        PricingError::ValidationError(err.to_string())
    }
}

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let body = self.to_error_response();
        (self.status_code(), Json(body)).into_response()
    }
}
