//! HTTP error mapping for handler results.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use waymark_core::Error;

/// Wrapper that renders core errors as `{"error": message}` JSON bodies
/// with the appropriate status code.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_)
            | Error::TripNotFound(_)
            | Error::LocationNotFound(_)
            | Error::TagNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(subsystem = "api", error = %self.0, "Request failed");
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// Shorthand for handler return types.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(ApiError(Error::TripNotFound(Uuid::nil())).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError(Error::LocationNotFound(Uuid::nil())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let err = ApiError(Error::InvalidInput("missing".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_config_maps_to_503() {
        let err = ApiError(Error::Config("no key".to_string()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            ApiError(Error::Unauthorized("no".to_string())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(Error::Forbidden("no".to_string())).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_everything_else_is_500() {
        let err = ApiError(Error::Internal("boom".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
