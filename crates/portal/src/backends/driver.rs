/// 存储后端抽象层
///
/// 每种存储技术实现同一个接口，由 BackendManager 按技术分发

use async_trait::async_trait;
use common::{Result, Technology};
use serde::{Deserialize, Serialize};

/// 后端创建卷的结果，Orchestrator 据此创建 PV/PVC
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedVolume {
    pub pv_name: String,
    /// Gluster 卷为空
    pub server: String,
    pub path: String,
    /// 异步后端的任务号，前端用来查询进度
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<u64>,
}

/// 存储后端 Trait
#[async_trait]
pub trait VolumeBackend: Send + Sync + 'static {
    /// 创建卷
    async fn create(&self, project: &str, pvc_name: &str, size: &str) -> Result<ProvisionedVolume>;

    /// 扩容已有的卷
    async fn grow(&self, pv_name: &str, new_size: &str) -> Result<()>;

    /// 存储技术
    fn technology(&self) -> Technology;
}
