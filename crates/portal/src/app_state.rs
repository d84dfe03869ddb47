/// 应用全局状态

use common::SizePolicy;
use std::sync::Arc;

use crate::backends::BackendManager;
use crate::clients::{PlatformApi, WorkflowApi};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    /// 存储后端（按技术分发）
    pub backends: Arc<BackendManager>,
    /// OpenShift API
    pub platform: Arc<dyn PlatformApi>,
    /// NFS 工作流引擎，用于查询任务进度
    pub workflow: Arc<dyn WorkflowApi>,
    pub size_policy: SizePolicy,
    /// Gluster Endpoints 地址
    pub gluster_ips: Arc<[String]>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        backends: BackendManager,
        platform: Arc<dyn PlatformApi>,
        workflow: Arc<dyn WorkflowApi>,
        size_policy: SizePolicy,
        gluster_ips: Vec<String>,
        jwt_secret: &str,
    ) -> Self {
        Self {
            backends: Arc::new(backends),
            platform,
            workflow,
            size_policy,
            gluster_ips: gluster_ips.into(),
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
