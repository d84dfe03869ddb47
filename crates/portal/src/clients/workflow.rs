/// NFS 工作流引擎客户端
///
/// 工作流引擎按模板异步执行任务：提交后返回任务号，之后通过轮询获取状态

use async_trait::async_trait;
use common::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// 创建 NFS 卷的工作流模板
pub const CREATE_WORKFLOW_UUID: &str = "64b3b95b-0d79-4563-8b88-f8c4486b40a0";

/// 扩容 NFS 卷的工作流模板
pub const CHANGE_WORKFLOW_UUID: &str = "186b1295-1b82-42e4-b04d-477da967e1d4";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// 提交任务的请求体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowCommand {
    pub user_input_values: Vec<KeyValue>,
}

/// 任务状态
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Submitted,
    Executing,
    Completed,
    Failed,
    /// 引擎的其他中间状态（PENDING、SCHEDULED 等）
    #[default]
    #[serde(other)]
    Other,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionProgress {
    #[serde(default)]
    pub current_command_index: u32,
    #[serde(default)]
    pub commands_number: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(default)]
    pub job_status: JobState,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub return_parameters: Vec<KeyValue>,
    #[serde(default)]
    pub workflow_execution_progress: ExecutionProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowJob {
    pub job_id: u64,
    #[serde(default)]
    pub job_status: JobStatus,
}

impl WorkflowJob {
    pub fn state(&self) -> JobState {
        self.job_status.job_status
    }

    /// 执行进度（百分比）
    pub fn progress(&self) -> f64 {
        let progress = &self.job_status.workflow_execution_progress;
        if progress.current_command_index == 0 || progress.commands_number == 0 {
            return 0.0;
        }
        100.0 / f64::from(progress.commands_number) * f64::from(progress.current_command_index)
    }

    pub fn return_parameter(&self, key: &str) -> Option<&str> {
        self.job_status
            .return_parameters
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

#[async_trait]
pub trait WorkflowApi: Send + Sync + 'static {
    /// 按模板提交任务
    async fn submit_job(&self, workflow_uuid: &str, cmd: &WorkflowCommand) -> Result<WorkflowJob>;

    /// 查询任务当前状态
    async fn get_job(&self, job_id: u64) -> Result<WorkflowJob>;
}

pub struct HttpWorkflowClient {
    client: Client,
    base_url: String,
    user: String,
    secret: String,
}

impl HttpWorkflowClient {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            user: user.into(),
            secret: secret.into(),
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn read_job(response: reqwest::Response, expected: StatusCode) -> Result<WorkflowJob> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Error reading workflow engine response: {}", e);
            Error::Upstream(String::new())
        })?;

        if status != expected {
            error!("Workflow engine answered {}: {}", status, body);
            return Err(Error::Upstream(String::new()));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Error parsing workflow job {:?}: {}", body, e);
            Error::Upstream(String::new())
        })
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowClient {
    async fn submit_job(&self, workflow_uuid: &str, cmd: &WorkflowCommand) -> Result<WorkflowJob> {
        let url = self.build_url(&format!("workflows/{}/jobs", workflow_uuid));
        debug!("Calling {}", url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.secret))
            .json(cmd)
            .send()
            .await
            .map_err(|e| {
                error!("Error calling workflow engine {}: {}", url, e);
                Error::Upstream(String::new())
            })?;

        Self::read_job(response, StatusCode::CREATED).await
    }

    async fn get_job(&self, job_id: u64) -> Result<WorkflowJob> {
        let url = self.build_url(&format!("workflows/jobs/{}", job_id));
        debug!("Calling {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.secret))
            .send()
            .await
            .map_err(|e| {
                error!("Error calling workflow engine {}: {}", url, e);
                Error::Upstream(String::new())
            })?;

        Self::read_job(response, StatusCode::OK).await
    }
}
