/// 应用全局状态

use std::sync::Arc;

use crate::metrics::MetricsCollector;
use crate::storage::{CapacityMonitor, GlusterVolumeManager};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub volumes: Arc<GlusterVolumeManager>,
    pub monitor: Arc<CapacityMonitor>,
    pub metrics: Arc<MetricsCollector>,
    /// `/sec` 路由的 basic auth 密码
    pub secret: Arc<str>,
    /// 容量检查默认阈值
    pub capacity_threshold: u8,
}

impl AppState {
    pub fn new(
        volumes: GlusterVolumeManager,
        monitor: CapacityMonitor,
        metrics: Arc<MetricsCollector>,
        secret: &str,
        capacity_threshold: u8,
    ) -> Self {
        Self {
            volumes: Arc::new(volumes),
            monitor: Arc::new(monitor),
            metrics,
            secret: Arc::from(secret),
            capacity_threshold,
        }
    }
}
