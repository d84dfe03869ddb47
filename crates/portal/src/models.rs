/// 卷管理接口的请求/响应结构

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::backends::ProvisionedVolume;
use crate::clients::workflow::{JobState, WorkflowJob};

/// 创建卷请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewVolumeRequest {
    #[validate(length(min = 1))]
    pub project: String,
    #[validate(length(min = 1))]
    pub size: String,
    #[validate(length(min = 1))]
    pub pvc_name: String,
    #[validate(length(min = 1))]
    pub mode: String,
    pub technology: String,
}

/// 重新创建 Gluster Service/Endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FixVolumeRequest {
    #[validate(length(min = 1))]
    pub project: String,
}

/// 扩容请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct GrowVolumeRequest {
    #[validate(length(min = 1))]
    pub project: String,
    #[validate(length(min = 1))]
    pub new_size: String,
    #[validate(length(min = 1))]
    pub pv_name: String,
    /// 未指定或为空时按 PV 名称前缀判断，取值错误是校验错误而不是反序列化错误
    #[serde(default)]
    pub technology: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVolumeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: ProvisionedVolume,
}

/// 任务进度
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressResponse {
    pub job_id: u64,
    pub status: JobState,
    pub progress: f64,
}

impl From<WorkflowJob> for JobProgressResponse {
    fn from(job: WorkflowJob) -> Self {
        Self {
            job_id: job.job_id,
            status: job.state(),
            progress: job.progress(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fail_validation() {
        let req: NewVolumeRequest =
            serde_json::from_value(serde_json::json!({"project": "team", "size": "1G"})).unwrap();
        assert!(req.validate().is_err());

        let req: GrowVolumeRequest = serde_json::from_value(serde_json::json!({
            "project": "team", "newSize": "2G", "pvName": "gl-team-pv1"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.technology, None);
    }

    #[test]
    fn test_grow_request_with_technology() {
        let req: GrowVolumeRequest = serde_json::from_value(serde_json::json!({
            "project": "team", "newSize": "2G", "pvName": "legacy", "technology": "nfs"
        }))
        .unwrap();
        assert_eq!(req.technology.as_deref(), Some("nfs"));

        // 未知取值也能反序列化，交给业务层返回 400
        let req: GrowVolumeRequest = serde_json::from_value(serde_json::json!({
            "project": "team", "newSize": "2G", "pvName": "legacy", "technology": "ceph"
        }))
        .unwrap();
        assert_eq!(req.technology.as_deref(), Some("ceph"));
    }
}
