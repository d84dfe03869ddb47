/// NFS 存储后端
///
/// 通过工作流引擎异步创建/扩容 NFS 卷，提交任务后轮询状态：
/// - 创建：任务进入 EXECUTING 后即返回（服务器和路径已经分配，前端继续查询进度）
/// - 扩容：等待任务 COMPLETED
///
/// 任何一次轮询看到 FAILED 都立即结束

use async_trait::async_trait;
use common::models::constants::NFS_PV_PREFIX;
use common::{Error, Result, Technology};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::driver::{ProvisionedVolume, VolumeBackend};
use crate::clients::workflow::{
    JobState, KeyValue, WorkflowApi, WorkflowCommand, WorkflowJob, CHANGE_WORKFLOW_UUID,
    CREATE_WORKFLOW_UUID,
};

/// 工作流返回服务器地址的参数名
const SERVER_PARAMETER: &str = "'Server' + $Projectname";

/// 轮询设置
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// 单个请求最长等待时间
    pub timeout: Duration,
}

/// 轮询目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollTarget {
    /// 任务已开始执行（或已完成）
    Executing,
    Completed,
}

impl PollTarget {
    fn reached_by(&self, state: JobState) -> bool {
        match self {
            PollTarget::Executing => matches!(state, JobState::Executing | JobState::Completed),
            PollTarget::Completed => state == JobState::Completed,
        }
    }
}

pub struct NfsBackend {
    workflow: Arc<dyn WorkflowApi>,
    poll: PollSettings,
    /// 服务关闭时取消所有轮询
    shutdown: CancellationToken,
}

impl NfsBackend {
    pub fn new(workflow: Arc<dyn WorkflowApi>, poll: PollSettings, shutdown: CancellationToken) -> Self {
        Self {
            workflow,
            poll,
            shutdown,
        }
    }

    /// 轮询任务直到达到目标状态
    async fn wait_for(&self, job_id: u64, target: PollTarget) -> Result<WorkflowJob> {
        let cancel = self.shutdown.child_token();
        let deadline = tokio::time::sleep(self.poll.timeout);
        tokio::pin!(deadline);

        let mut ticker = tokio::time::interval(self.poll.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // 等待 tick 和查询任务状态都受取消和超时约束
            let poll = async {
                ticker.tick().await;
                self.workflow.get_job(job_id).await
            };

            let job = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    warn!("Stopped polling workflow job {}: shutting down", job_id);
                    return Err(Error::Cancelled(format!("workflow job {}", job_id)));
                }
                _ = &mut deadline => {
                    error!("Workflow job {} did not reach {:?} in {:?}", job_id, target, self.poll.timeout);
                    return Err(Error::Timeout(format!("workflow job {}", job_id)));
                }
                job = poll => job?,
            };

            match job.state() {
                JobState::Failed => {
                    error!(
                        "Workflow job {} failed: {}",
                        job_id,
                        job.job_status.error_message.as_deref().unwrap_or("")
                    );
                    return Err(Error::Upstream(String::new()));
                }
                state if target.reached_by(state) => return Ok(job),
                state => debug!("Workflow job {} is {:?}, waiting", job_id, state),
            }
        }
    }
}

/// 解析 `server:path`，只按第一个 `:` 切分
fn server_and_path(job: &WorkflowJob) -> Result<(String, String)> {
    let value = job.return_parameter(SERVER_PARAMETER).ok_or_else(|| {
        error!("Workflow job {} has no return parameter {}", job.job_id, SERVER_PARAMETER);
        Error::Upstream(String::new())
    })?;

    match value.split_once(':') {
        Some((server, path)) if !server.is_empty() && !path.is_empty() => {
            Ok((server.to_string(), path.to_string()))
        }
        _ => {
            error!("Couldn't parse nfs server or path from {:?}", value);
            Err(Error::Upstream(String::new()))
        }
    }
}

#[async_trait]
impl VolumeBackend for NfsBackend {
    async fn create(&self, project: &str, pvc_name: &str, size: &str) -> Result<ProvisionedVolume> {
        let cmd = WorkflowCommand {
            user_input_values: vec![
                KeyValue::new("Projectname", format!("vol_{}-{}", project, pvc_name)),
                KeyValue::new("Projectsize", size.trim_end_matches('G')),
            ],
        };

        let job = self.workflow.submit_job(CREATE_WORKFLOW_UUID, &cmd).await?;
        info!("Submitted nfs volume job {} for project {}", job.job_id, project);

        let job = self.wait_for(job.job_id, PollTarget::Executing).await?;
        let (server, path) = server_and_path(&job)?;

        Ok(ProvisionedVolume {
            pv_name: format!("{}{}-{}", NFS_PV_PREFIX, project, pvc_name),
            server,
            path,
            job_id: Some(job.job_id),
        })
    }

    async fn grow(&self, pv_name: &str, new_size: &str) -> Result<()> {
        let volume = pv_name.strip_prefix(NFS_PV_PREFIX).ok_or_else(|| {
            Error::Validation(format!("{} is not an nfs volume name", pv_name))
        })?;

        let cmd = WorkflowCommand {
            user_input_values: vec![
                KeyValue::new("Projectname", format!("vol_{}", volume)),
                KeyValue::new("newSize", new_size.trim_end_matches('G')),
            ],
        };

        let job = self.workflow.submit_job(CHANGE_WORKFLOW_UUID, &cmd).await?;
        info!("Submitted nfs grow job {} for {}", job.job_id, pv_name);

        self.wait_for(job.job_id, PollTarget::Completed).await?;
        info!("Grew nfs volume {} to {}", pv_name, new_size);
        Ok(())
    }

    fn technology(&self) -> Technology {
        Technology::Nfs
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 工作流引擎替身：按顺序返回预设状态，最后一个状态一直保持
    #[derive(Default)]
    pub struct ScriptedWorkflow {
        pub submitted: Mutex<Vec<(String, WorkflowCommand)>>,
        states: Mutex<VecDeque<JobState>>,
        polls: Mutex<u32>,
        server: Mutex<Option<String>>,
    }

    impl ScriptedWorkflow {
        pub fn new(states: &[JobState], server: Option<&str>) -> Self {
            Self {
                states: Mutex::new(states.iter().copied().collect()),
                server: Mutex::new(server.map(str::to_string)),
                ..Default::default()
            }
        }

        pub fn polls(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl WorkflowApi for ScriptedWorkflow {
        async fn submit_job(&self, uuid: &str, cmd: &WorkflowCommand) -> Result<WorkflowJob> {
            self.submitted.lock().unwrap().push((uuid.to_string(), cmd.clone()));
            Ok(WorkflowJob {
                job_id: 42,
                job_status: Default::default(),
            })
        }

        async fn get_job(&self, job_id: u64) -> Result<WorkflowJob> {
            *self.polls.lock().unwrap() += 1;
            let mut states = self.states.lock().unwrap();
            let state = if states.len() > 1 {
                states.pop_front().unwrap_or_default()
            } else {
                states.front().copied().unwrap_or_default()
            };

            let mut job = WorkflowJob {
                job_id,
                job_status: Default::default(),
            };
            job.job_status.job_status = state;
            if let Some(server) = self.server.lock().unwrap().clone() {
                job.job_status.return_parameters = vec![KeyValue::new(SERVER_PARAMETER, server)];
            }
            Ok(job)
        }
    }
}
