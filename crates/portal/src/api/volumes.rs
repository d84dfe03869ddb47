/// 卷管理接口

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::models::ApiResponse;
use common::Error;

use super::error::ApiError;
use crate::app_state::AppState;
use crate::extractors::AuthUser;
use crate::models::{FixVolumeRequest, GrowVolumeRequest, NewVolumeRequest};
use crate::services::VolumeService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/volume", post(create_volume))
        .route("/volume/fix", post(fix_volume))
        .route("/volume/grow", post(grow_volume))
        .route("/volume/job/:job_id", get(job_status))
}

/// 创建卷
async fn create_volume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewVolumeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = VolumeService::new(state);
    let response = service.create_volume(&user.username, req).await?;
    Ok(Json(response))
}

/// 重新创建 Gluster Service/Endpoints
async fn fix_volume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<FixVolumeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = VolumeService::new(state);
    let message = service.fix_volume(&user.username, req).await?;
    Ok(Json(ApiResponse::new(message)))
}

/// 扩容卷
async fn grow_volume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GrowVolumeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = VolumeService::new(state);
    let message = service.grow_volume(&user.username, req).await?;
    Ok(Json(ApiResponse::new(message)))
}

/// 查询 NFS 任务进度
async fn job_status(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id: u64 = job_id
        .parse()
        .map_err(|_| Error::Validation(format!("Invalid job id: {}", job_id)))?;

    let service = VolumeService::new(state);
    let progress = service.job_status(job_id).await?;
    Ok(Json(progress))
}
