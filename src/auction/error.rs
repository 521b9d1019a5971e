// region:    --- Imports
use crate::auction::model::AuctionStatus;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Error Taxonomy

/// Typed result of every core operation. Nothing here propagates as an
/// unhandled fault; the axum layer converts each variant to a status code
/// and a JSON body with `error` and `code` fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuctionError {
    // Validation
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("username is already taken: {0}")]
    UsernameTaken(String),
    #[error("bid amount must be positive")]
    NonPositiveAmount,

    // Authorization
    #[error("caller is not permitted to perform this operation")]
    Forbidden,

    // State
    #[error("auction is not running")]
    NotRunning,
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AuctionStatus,
        to: AuctionStatus,
    },
    #[error("auction window has expired")]
    Expired,
    #[error("ledger already open for auction {0}")]
    AlreadyOpen(i64),
    #[error("auction has not ended yet")]
    NotEnded,

    // Conflict: expected and frequent under contention, callers retry with a
    // fresh read of current_price.
    #[error("bid must be at most {floor} (current price {current_price}, minimum decrement applies)")]
    PriceTooHigh { current_price: i64, floor: i64 },

    // Not found
    #[error("auction {0} not found")]
    AuctionNotFound(i64),
    #[error("user {0} not found")]
    UserNotFound(i64),

    // Persistence seam
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl AuctionError {
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::InvalidParams(_) => "INVALID_PARAMS",
            AuctionError::UsernameTaken(_) => "USERNAME_TAKEN",
            AuctionError::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            AuctionError::Forbidden => "FORBIDDEN",
            AuctionError::NotRunning => "NOT_RUNNING",
            AuctionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AuctionError::Expired => "EXPIRED",
            AuctionError::AlreadyOpen(_) => "ALREADY_OPEN",
            AuctionError::NotEnded => "NOT_ENDED",
            AuctionError::PriceTooHigh { .. } => "PRICE_TOO_HIGH",
            AuctionError::AuctionNotFound(_) | AuctionError::UserNotFound(_) => "NOT_FOUND",
            AuctionError::Unavailable(_) => "UNAVAILABLE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::InvalidParams(_)
            | AuctionError::UsernameTaken(_)
            | AuctionError::NonPositiveAmount => StatusCode::BAD_REQUEST,
            AuctionError::Forbidden => StatusCode::FORBIDDEN,
            AuctionError::NotRunning
            | AuctionError::InvalidTransition { .. }
            | AuctionError::Expired
            | AuctionError::AlreadyOpen(_)
            | AuctionError::NotEnded
            | AuctionError::PriceTooHigh { .. } => StatusCode::CONFLICT,
            AuctionError::AuctionNotFound(_) | AuctionError::UserNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AuctionError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let body = match &self {
            AuctionError::PriceTooHigh {
                current_price,
                floor,
            } => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
                "current_price": current_price,
                "floor": floor,
            }),
            _ => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
            }),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

// endregion: --- Error Taxonomy
