use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, message) = match self {
            ApiError::ClientError(message) => {
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::ServerError(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResponse<T> = Result<T, ApiError>;

pub trait IntoApiResponse<T> {
    fn into_response(self, message: &str) -> ApiResponse<T>;
}

impl<T, E> IntoApiResponse<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn into_response(self, message: &str) -> ApiResponse<T> {
        self.map_err(|e| {
            let e = e.into();
            error!("{:?}", e);
            ApiError::ServerError(format!("{}: {:#}", message, e))
        })
    }
}
