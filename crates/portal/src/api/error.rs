/// API 错误响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::models::ApiResponse;
use common::Error;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// 缺少或无效的 Bearer token
    Unauthorized(String),
    Service(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Service(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Service(err) => match err {
                Error::Validation(_) | Error::Capacity { .. } => StatusCode::BAD_REQUEST,
                Error::Permission { .. } => StatusCode::FORBIDDEN,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::Upstream(_) | Error::Relayed(_) => StatusCode::BAD_GATEWAY,
                Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                Error::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Unauthorized(msg) => msg,
            ApiError::Service(err) => {
                if status.is_server_error() {
                    error!("Request failed: {}", err);
                }
                err.public_message()
            }
        };

        (status, Json(ApiResponse::new(message))).into_response()
    }
}
