/// 管理接口认证
///
/// `/sec` 下的路由要求 basic auth，用户名固定为 `GLUSTER_API`

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use common::models::constants::GLUSTER_API_USER;
use common::models::ApiResponse;
use tracing::warn;

use crate::app_state::AppState;

pub async fn basic_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if is_authorized(request.headers(), &state.secret) {
        return next.run(request).await;
    }

    warn!("Rejected unauthenticated request to {}", request.uri());
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"glusterapi\"")],
        Json(ApiResponse::new("Unauthorized")),
    )
        .into_response()
}

fn is_authorized(headers: &HeaderMap, secret: &str) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let Some(encoded) = value.trim().strip_prefix("Basic ") else {
        return false;
    };

    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };

    match String::from_utf8(decoded) {
        Ok(credentials) => match credentials.split_once(':') {
            Some((user, password)) => user == GLUSTER_API_USER && password == secret,
            None => false,
        },
        Err(_) => false,
    }
}
