/// 请求提取器
///
/// 登录由外部认证服务负责，这里只校验 Bearer token 并取出用户名

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::ApiError;
use crate::app_state::AppState;

/// JWT 载荷
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// 用户名
    pub id: String,
    pub exp: usize,
}

/// 当前登录用户
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| ApiError::Unauthorized("No Bearer Token was provided".to_string()))?;

        let claims = decode_token(token, &state.jwt_secret)?;
        Ok(AuthUser {
            username: claims.id,
        })
    }
}

fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized("Invalid token".to_string())
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Claims;
    use jsonwebtoken::{encode, EncodingKey, Header};

    /// 签发测试用 token
    pub fn token_for(username: &str, secret: &str) -> String {
        let claims = Claims {
            id: username.to_string(),
            exp: 4_102_444_800,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}
