/// 共享数据模型
///
/// 定义 Portal 和 Gluster 节点服务之间交换的数据结构

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// 存储技术
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Gluster,
    Nfs,
}

impl Technology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Technology::Gluster => "gluster",
            Technology::Nfs => "nfs",
        }
    }

    /// 根据 PV 名称前缀推断存储技术（兼容旧的命名方式）
    pub fn from_pv_name(pv_name: &str) -> Option<Self> {
        if pv_name.starts_with(constants::GLUSTER_PV_PREFIX) {
            Some(Technology::Gluster)
        } else if pv_name.starts_with(constants::NFS_PV_PREFIX) {
            Some(Technology::Nfs)
        } else {
            None
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gluster" => Ok(Technology::Gluster),
            "nfs" => Ok(Technology::Nfs),
            _ => Err(Error::Validation(
                "Invalid technology. Must be either nfs or gluster".to_string(),
            )),
        }
    }
}

/// PV/PVC 访问模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWriteOnce,
    ReadOnlyMany,
    ReadWriteMany,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::ReadWriteOnce => "ReadWriteOnce",
            AccessMode::ReadOnlyMany => "ReadOnlyMany",
            AccessMode::ReadWriteMany => "ReadWriteMany",
        }
    }
}

impl FromStr for AccessMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ReadWriteOnce" => Ok(AccessMode::ReadWriteOnce),
            "ReadOnlyMany" => Ok(AccessMode::ReadOnlyMany),
            "ReadWriteMany" => Ok(AccessMode::ReadWriteMany),
            _ => Err(Error::Validation(format!(
                "Invalid access mode {}. Must be ReadWriteOnce, ReadOnlyMany or ReadWriteMany",
                s
            ))),
        }
    }
}

/// 创建 Gluster 卷（Portal -> 节点）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateVolumeCommand {
    pub project: String,
    pub size: String,
}

/// 扩容卷（Portal -> 节点，节点 -> 对端节点）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrowVolumeCommand {
    pub pv_name: String,
    pub new_size: String,
}

/// 在对端节点上创建逻辑卷（节点 -> 对端节点）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLvCommand {
    pub lv_name: String,
    pub size: String,
    pub mount_point: String,
}

/// 通用响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub message: String,
}

impl ApiResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 卷使用量（单位 KB）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeUsage {
    pub total_kilo_bytes: u64,
    pub used_kilo_bytes: u64,
}

impl VolumeUsage {
    /// 使用百分比，总量为 0 时返回 None
    pub fn used_percent(&self) -> Option<f64> {
        if self.total_kilo_bytes == 0 {
            return None;
        }
        Some(self.used_kilo_bytes as f64 / self.total_kilo_bytes as f64 * 100.0)
    }
}

/// 常量定义
pub mod constants {
    /// Gluster PV 名称前缀
    pub const GLUSTER_PV_PREFIX: &str = "gl-";

    /// NFS PV 名称前缀
    pub const NFS_PV_PREFIX: &str = "nfs-";

    /// 节点管理 API 的 basic auth 用户名
    pub const GLUSTER_API_USER: &str = "GLUSTER_API";

    /// 用户项目中 Gluster Service/Endpoints 的名称
    pub const GLUSTER_CLUSTER_OBJECT: &str = "glusterfs-cluster";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technology_parse() {
        assert_eq!("gluster".parse::<Technology>().unwrap(), Technology::Gluster);
        assert_eq!("nfs".parse::<Technology>().unwrap(), Technology::Nfs);
        assert!("ceph".parse::<Technology>().is_err());
        assert!("NFS".parse::<Technology>().is_err());
    }

    #[test]
    fn test_technology_from_pv_name() {
        assert_eq!(Technology::from_pv_name("gl-project-pv1"), Some(Technology::Gluster));
        assert_eq!(Technology::from_pv_name("nfs-project-data"), Some(Technology::Nfs));
        assert_eq!(Technology::from_pv_name("project-pv1"), None);
    }

    #[test]
    fn test_wire_field_names() {
        let cmd = GrowVolumeCommand {
            pv_name: "project_pv1".to_string(),
            new_size: "10G".to_string(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["pvName"], "project_pv1");
        assert_eq!(json["newSize"], "10G");

        let usage: VolumeUsage =
            serde_json::from_str(r#"{"totalKiloBytes":100,"usedKiloBytes":25}"#).unwrap();
        assert_eq!(usage.used_percent(), Some(25.0));
    }

    #[test]
    fn test_used_percent_empty_device() {
        let usage = VolumeUsage {
            total_kilo_bytes: 0,
            used_kilo_bytes: 0,
        };
        assert_eq!(usage.used_percent(), None);
    }
}
