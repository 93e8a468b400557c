use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Typed failure outcomes of the core operations. Mapping to wire status
/// codes happens once, in `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("user not found")]
    UnknownUser,

    #[error("operation not permitted")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("user_id already exists")]
    DuplicateKey,

    #[error("{0}")]
    BadRequest(String),

    #[error("store unreachable")]
    StoreUnavailable,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidCredentials | ApiError::InvalidToken | ApiError::UnknownUser => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateKey => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(ref e) => {
                error!(error = %e, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::DuplicateKey,
            // the only foreign key in the schema points at users(user_id)
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                ApiError::NotFound("student")
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => ApiError::StoreUnavailable,
            _ => ApiError::Internal(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_maps_to_conflict() {
        let res = ApiError::DuplicateKey.into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn auth_failures_map_to_unauthorized() {
        for e in [
            ApiError::InvalidCredentials,
            ApiError::InvalidToken,
            ApiError::UnknownUser,
        ] {
            assert_eq!(e.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn store_timeout_maps_to_service_unavailable() {
        let e: ApiError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(e, ApiError::StoreUnavailable));
    }
}
