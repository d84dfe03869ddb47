/// Gluster API
///
/// 运行在每个 Gluster 存储节点上，负责创建/扩容逻辑卷和 Gluster 卷，并提供 brick 容量检查

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod app_state;
mod cluster;
mod config;
mod metrics;
mod middleware;
mod storage;

use crate::app_state::AppState;
use crate::cluster::{HttpPeerClient, PeerDiscovery};
use crate::storage::{CapacityMonitor, CommandRunner, GlusterVolumeManager, ShellRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    // 可以通过环境变量 RUST_LOG 设置日志级别，例如：
    // RUST_LOG=glusterapi=info
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    info!("🚀 启动 Gluster API...");

    // 加载配置
    dotenvy::dotenv().ok();
    let cfg = config::Config::from_env()?;
    info!("✅ 配置加载成功");

    let size_policy = common::SizePolicy::new(cfg.max_volume_gb)?;
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellRunner);

    info!("📊 初始化指标收集器...");
    let metrics = Arc::new(metrics::MetricsCollector::new()?);

    info!("🔗 初始化对端客户端 (port: {})...", cfg.port);
    let peer_client = HttpPeerClient::new(
        cfg.port,
        cfg.secret.clone(),
        Duration::from_secs(cfg.peer_timeout_secs),
    )?;
    let discovery = PeerDiscovery::new(runner.clone(), cfg.node_ip);
    match discovery.local_server_ip() {
        Ok(ip) => info!("📌 节点 {} 地址: {}", cfg.node_name, ip),
        Err(e) => tracing::warn!("节点 {} 未找到可用的 IPv4 地址: {}", cfg.node_name, e),
    }

    info!("💾 初始化卷管理器 (vg: {}, replicas: {})...", cfg.vg_name, cfg.replicas);
    let volumes = GlusterVolumeManager::new(
        cfg.lvm_settings(),
        size_policy,
        runner.clone(),
        discovery,
        Arc::new(peer_client),
    );
    let monitor = CapacityMonitor::new(runner, metrics.clone(), cfg.base_path.clone());

    let app_state = AppState::new(volumes, monitor, metrics, &cfg.secret, cfg.capacity_threshold);
    let app = api::router(app_state);

    // 启动服务器
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("🎯 服务器监听在 http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Gluster API 已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
