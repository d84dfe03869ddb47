/// 存储管理
///
/// 本地命令执行、LVM/Gluster 卷管理和 brick 容量监控

pub mod executor;
pub mod monitoring;
pub mod volume;

pub use executor::{CommandRunner, ShellRunner};
pub use monitoring::CapacityMonitor;
pub use volume::{GlusterVolumeManager, LvmSettings};
