/// 卷管理接口

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::models::{ApiResponse, CreateLvCommand, CreateVolumeCommand, GrowVolumeCommand};
use serde::Deserialize;
use tracing::info;

use super::error::ApiError;
use crate::app_state::AppState;

/// 容量检查查询参数
#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub threshold: Option<u8>,
}

/// 需要认证的路由（Portal 和对端节点调用）
pub fn secured_routes() -> Router<AppState> {
    Router::new()
        .route("/volume", post(create_volume))
        .route("/volume/grow", post(grow_volume))
        .route("/lv", post(create_lv))
        .route("/lv/grow", post(grow_lv))
}

/// 只读路由
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/volume/:pv_name", get(get_volume_usage))
        .route("/volume/:pv_name/check", get(check_volume_usage))
}

/// 创建卷，返回卷标识
async fn create_volume(
    State(state): State<AppState>,
    Json(cmd): Json<CreateVolumeCommand>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Creating volume for project {} with size {}", cmd.project, cmd.size);
    let result = state.volumes.create_volume(&cmd.project, &cmd.size).await;
    state.metrics.record_operation("create_volume", &result);

    let volume_id = result?;
    Ok(Json(ApiResponse::new(volume_id)))
}

async fn grow_volume(
    State(state): State<AppState>,
    Json(cmd): Json<GrowVolumeCommand>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Growing volume {} to {}", cmd.pv_name, cmd.new_size);
    let result = state.volumes.grow_volume(&cmd.pv_name, &cmd.new_size).await;
    state.metrics.record_operation("grow_volume", &result);

    result?;
    Ok(Json(ApiResponse::new("Volume grown")))
}

/// 对端节点调用：只在本机创建逻辑卷
async fn create_lv(
    State(state): State<AppState>,
    Json(cmd): Json<CreateLvCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .volumes
        .create_lv(&cmd.lv_name, &cmd.size, &cmd.mount_point)
        .await;
    state.metrics.record_operation("create_lv", &result);

    result?;
    Ok(Json(ApiResponse::new("Logical volume created")))
}

async fn grow_lv(
    State(state): State<AppState>,
    Json(cmd): Json<GrowVolumeCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.volumes.grow_lv(&cmd.pv_name, &cmd.new_size).await;
    state.metrics.record_operation("grow_lv", &result);

    result?;
    Ok(Json(ApiResponse::new("Logical volume grown")))
}

async fn get_volume_usage(
    State(state): State<AppState>,
    Path(pv_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usage = state.monitor.get_volume_usage(&pv_name).await?;
    Ok(Json(usage))
}

async fn check_volume_usage(
    State(state): State<AppState>,
    Path(pv_name): Path<String>,
    Query(query): Query<CheckQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let threshold = query.threshold.unwrap_or(state.capacity_threshold);
    state.monitor.check_volume_usage(&pv_name, threshold).await?;
    Ok(Json(ApiResponse::new(format!(
        "Usage of volume {} is below {}%",
        pv_name, threshold
    ))))
}

/// Prometheus 指标
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.render()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
