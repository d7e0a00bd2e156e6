//! Mapping of lending errors onto HTTP responses

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use booklend_core::{ErrorKind, LendingError, ParseStatusError};

/// Error returned by every handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Lending(#[from] LendingError),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid access token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ParseStatusError> for ApiError {
    fn from(err: ParseStatusError) -> Self {
        ApiError::Lending(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Lending(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::InvalidState | ErrorKind::LimitExceeded | ErrorKind::Validation => {
                    StatusCode::BAD_REQUEST
                }
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (
            status,
            Json(serde_json::json!({
                "success": false,
                "message": message,
            })),
        )
            .into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"booklend\""),
            );
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use booklend_core::PersistenceError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                LendingError::NotFound {
                    entity: "Book",
                    id: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                LendingError::InvalidState("busy".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                LendingError::Forbidden("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                LendingError::LimitExceeded { limit: 5 },
                StatusCode::BAD_REQUEST,
            ),
            (
                LendingError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                LendingError::Persistence(PersistenceError::Database("disk".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unauthorized_sets_challenge() {
        let response = ApiError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }
}
