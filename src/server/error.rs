use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Every failure a handler can report. The variant alone decides the status code
/// and the message sent back; the payload is only logged.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unprocessable entity: {0}")]
    UnprocessableEntity(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: &'static str,
    error: u16,
}

impl ApiError {
    pub fn bad_request(cause: impl std::fmt::Display) -> Self {
        ApiError::BadRequest(cause.to_string())
    }

    pub fn not_found(cause: impl std::fmt::Display) -> Self {
        ApiError::NotFound(cause.to_string())
    }

    pub fn unprocessable(cause: impl std::fmt::Display) -> Self {
        ApiError::UnprocessableEntity(cause.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "The request was not formatted correctly",
            ApiError::NotFound(_) => "The requested resource could not be found",
            ApiError::UnprocessableEntity(_) => "The request could not be processed",
            ApiError::Internal(_) => "Something went wrong on serverside",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::info!("{self}");
        }
        let body = ErrorBody {
            success: false,
            message: self.message(),
            error: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn envelope_carries_status_code() {
        let (status, body) = body_of(ApiError::not_found("question 7")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "message": "The requested resource could not be found",
                "error": 404
            })
        );
    }

    #[tokio::test]
    async fn every_kind_maps_to_its_own_code() {
        for (err, code) in [
            (ApiError::bad_request("x"), 400),
            (ApiError::unprocessable("x"), 422),
            (ApiError::Internal("x".to_owned()), 500),
        ] {
            let (status, body) = body_of(err).await;
            assert_eq!(status.as_u16(), code);
            assert_eq!(body["error"], code);
            assert_eq!(body["success"], false);
        }
    }

    #[test]
    fn cause_is_kept_out_of_the_message() {
        let err = ApiError::unprocessable("UNIQUE constraint failed");
        assert_eq!(err.message(), "The request could not be processed");
        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }
}
