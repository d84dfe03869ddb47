/// Storage Portal
///
/// 自助式存储卷申请：创建/扩容 Gluster 或 NFS 卷，并绑定到用户的 OpenShift 项目

use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod api;
mod app_state;
mod backends;
mod clients;
mod config;
mod extractors;
mod models;
mod services;

use crate::app_state::AppState;
use crate::backends::{BackendManager, GlusterBackend, NfsBackend, PollSettings};
use crate::clients::{HttpWorkflowClient, OpenShiftClient, WorkflowApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    // 可以通过环境变量 RUST_LOG 设置日志级别，例如：
    // RUST_LOG=portal=info
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    info!("🚀 启动 Storage Portal...");

    // 加载配置
    dotenvy::dotenv().ok();
    let cfg = config::Config::from_env()?;
    info!("✅ 配置加载成功");

    let size_policy = common::SizePolicy::new(cfg.max_volume_gb)?;
    let shutdown = CancellationToken::new();

    info!("🔗 连接 OpenShift API: {}", cfg.openshift_api);
    let platform = OpenShiftClient::new(
        cfg.openshift_api.clone(),
        cfg.openshift_token.clone(),
        cfg.openshift_insecure_tls,
        cfg.http_timeout(),
    )?;

    let workflow: Arc<dyn WorkflowApi> = Arc::new(HttpWorkflowClient::new(
        cfg.nfs_api_url.clone(),
        cfg.nfs_api_user.clone(),
        cfg.nfs_api_secret.clone(),
        cfg.http_timeout(),
    )?);

    info!("💾 注册存储后端...");
    let mut backends = BackendManager::new();
    backends.register(Arc::new(GlusterBackend::new(
        cfg.gluster_api_url.clone(),
        cfg.gluster_secret.clone(),
        cfg.http_timeout(),
    )?));
    backends.register(Arc::new(NfsBackend::new(
        workflow.clone(),
        PollSettings {
            interval: cfg.nfs_poll_interval(),
            timeout: cfg.nfs_poll_timeout(),
        },
        shutdown.clone(),
    )));

    let app_state = AppState::new(
        backends,
        Arc::new(platform),
        workflow,
        size_policy,
        cfg.gluster_ip_list(),
        &cfg.jwt_secret,
    );
    let app = api::router(app_state);

    // 启动服务器
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server_port));
    info!("🎯 服务器监听在 http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("👋 Storage Portal 已停止");
    Ok(())
}

/// 收到 Ctrl-C 后取消所有进行中的 NFS 轮询
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到停止信号，取消进行中的任务...");
    shutdown.cancel();
}
