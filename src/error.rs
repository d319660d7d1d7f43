//! Error types shared by the domain rules, the store and the HTTP layer
//!
//! Every failure is recoverable at the call boundary: handlers turn a
//! [`TripError`] into a JSON error body and the caller re-prompts.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TripError {
    /// A required field is missing or malformed
    #[error("{0}")]
    Validation(String),

    /// The trip already has `max_participants` commitments and the
    /// submitted name matches none of them
    #[error("Trip is full: all {max_participants} participant spots are taken")]
    Capacity { max_participants: u32 },

    #[error("{0} not found")]
    NotFound(String),

    /// Every generated join code collided with an existing trip
    #[error("Could not allocate a unique trip code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TripError>;

impl TripError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Machine-readable kind, sent as the `code` field of error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Capacity { .. } => "capacity_error",
            Self::NotFound(_) => "not_found",
            Self::CodeSpaceExhausted { .. } | Self::Storage(_) | Self::Serialization(_) => {
                "internal_error"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Capacity { .. } => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::CodeSpaceExhausted { .. } | Self::Storage(_) | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// redb splits its failures across several types; all of them fold into redb::Error.
macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for TripError {
                fn from(err: $ty) -> Self {
                    Self::Storage(err.into())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

// Malformed, incomplete or mistyped request bodies are the caller's to fix
impl From<JsonRejection> for TripError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for TripError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the log
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({
                "error": message,
                "code": self.kind(),
            })),
        )
            .into_response()
    }
}
