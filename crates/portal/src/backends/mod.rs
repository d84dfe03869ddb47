/// 存储后端
///
/// 支持 Gluster（同步，经由存储节点）和 NFS（异步，经由工作流引擎）

pub mod driver;
pub mod gluster;
pub mod manager;
pub mod nfs;

pub use driver::{ProvisionedVolume, VolumeBackend};
pub use gluster::GlusterBackend;
pub use manager::BackendManager;
pub use nfs::{NfsBackend, PollSettings};
