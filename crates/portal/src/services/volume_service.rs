/// 卷管理服务
///
/// 校验请求、检查项目权限、调用存储后端，然后在用户项目中创建 PV/PVC。
/// 存储后端成功后平台对象创建失败不会回滚，需要平台运维手工处理

use common::models::AccessMode;
use common::{Error, Result, Technology};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::clients::objects::{self, PvSource};
use crate::models::{
    FixVolumeRequest, GrowVolumeRequest, JobProgressResponse, NewVolumeRequest, NewVolumeResponse,
};

pub const VOLUME_CREATED: &str =
    "The volume was created. The PVC and the Gluster service and endpoints were added to your project.";
pub const GLUSTER_OBJECTS_CREATED: &str = "The gluster objects were created in your project.";
pub const VOLUME_GROWN: &str = "The volume was grown.";

const MISSING_FIELDS: &str = "Not all fields are filled in";

pub struct VolumeService {
    state: AppState,
}

impl VolumeService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// 创建卷并绑定到项目
    pub async fn create_volume(&self, username: &str, req: NewVolumeRequest) -> Result<NewVolumeResponse> {
        let span = info_span!(
            "create_volume",
            operation_id = %Uuid::new_v4(),
            project = %req.project
        );
        self.provision(username, req).instrument(span).await
    }

    /// 扩容已有的卷
    pub async fn grow_volume(&self, username: &str, req: GrowVolumeRequest) -> Result<&'static str> {
        let span = info_span!(
            "grow_volume",
            operation_id = %Uuid::new_v4(),
            project = %req.project
        );
        self.grow(username, req).instrument(span).await
    }

    /// 重新创建项目中的 Gluster Service/Endpoints
    pub async fn fix_volume(&self, username: &str, req: FixVolumeRequest) -> Result<&'static str> {
        let span = info_span!(
            "fix_volume",
            operation_id = %Uuid::new_v4(),
            project = %req.project
        );
        self.fix(username, req).instrument(span).await
    }

    /// 查询 NFS 工作流任务进度
    pub async fn job_status(&self, job_id: u64) -> Result<JobProgressResponse> {
        let job = self.state.workflow.get_job(job_id).await?;
        Ok(job.into())
    }

    async fn provision(&self, username: &str, req: NewVolumeRequest) -> Result<NewVolumeResponse> {
        let (technology, mode) = self.validate_new_volume(username, &req).await?;
        let backend = self.state.backends.get(technology)?;

        info!(
            "User {} requested a {} volume of {} for pvc {}",
            username, technology, req.size, req.pvc_name
        );
        let volume = backend.create(&req.project, &req.pvc_name, &req.size).await?;

        let source = match technology {
            Technology::Gluster => PvSource::Gluster {
                path: volume.path.clone(),
            },
            Technology::Nfs => PvSource::Nfs {
                server: volume.server.clone(),
                path: volume.path.clone(),
            },
        };

        let pv = objects::persistent_volume(&volume.pv_name, &req.size, mode, &source);
        self.state.platform.create_persistent_volume(&pv).await?;

        let pvc = objects::persistent_volume_claim(&req.pvc_name, &req.size, mode, &volume.pv_name);
        self.state
            .platform
            .create_persistent_volume_claim(&req.project, &pvc)
            .await?;
        info!("Bound {} to pvc {}", volume.pv_name, req.pvc_name);

        let message = match technology {
            Technology::Gluster => {
                self.create_gluster_objects(&req.project).await?;
                Some(VOLUME_CREATED.to_string())
            }
            Technology::Nfs => None,
        };

        Ok(NewVolumeResponse {
            message,
            data: volume,
        })
    }

    async fn grow(&self, username: &str, req: GrowVolumeRequest) -> Result<&'static str> {
        required_fields(&req)?;

        let technology = match req.technology.as_deref() {
            None | Some("") => None,
            Some(value) => Some(value.parse::<Technology>()?),
        };
        let backend = self
            .state
            .backends
            .for_existing_volume(&req.pv_name, technology)?;
        self.state
            .size_policy
            .validate(&req.new_size, backend.technology().as_str())?;
        self.check_permission(username, &req.project).await?;

        info!("User {} grows {} to {}", username, req.pv_name, req.new_size);
        backend.grow(&req.pv_name, &req.new_size).await?;
        Ok(VOLUME_GROWN)
    }

    async fn fix(&self, username: &str, req: FixVolumeRequest) -> Result<&'static str> {
        required_fields(&req)?;
        self.check_permission(username, &req.project).await?;
        self.create_gluster_objects(&req.project).await?;
        Ok(GLUSTER_OBJECTS_CREATED)
    }

    /// 按顺序校验：必填字段、大小、访问模式、权限、PVC 名称、存储技术
    async fn validate_new_volume(
        &self,
        username: &str,
        req: &NewVolumeRequest,
    ) -> Result<(Technology, AccessMode)> {
        required_fields(req)?;
        self.state.size_policy.validate(&req.size, &req.technology)?;
        let mode: AccessMode = req.mode.parse()?;
        self.check_permission(username, &req.project).await?;

        let existing = self.state.platform.list_pvc_names(&req.project).await?;
        if existing.iter().any(|name| *name == req.pvc_name) {
            return Err(Error::Validation(format!(
                "A PVC named {} already exists in project {}",
                req.pvc_name, req.project
            )));
        }

        let technology: Technology = req.technology.parse()?;
        Ok((technology, mode))
    }

    async fn check_permission(&self, username: &str, project: &str) -> Result<()> {
        let admins = self.state.platform.project_admins(project).await?;
        if admins.permits(username) {
            return Ok(());
        }

        warn!("User {} is not an admin of project {}", username, project);
        Err(Error::Permission {
            admins: admins.admins,
        })
    }

    /// Service/Endpoints 已存在时视为成功
    async fn create_gluster_objects(&self, project: &str) -> Result<()> {
        self.state
            .platform
            .create_service(project, &objects::gluster_service())
            .await?;
        self.state
            .platform
            .create_endpoints(project, &objects::gluster_endpoints(&self.state.gluster_ips))
            .await?;
        info!("Gluster service and endpoints present in project {}", project);
        Ok(())
    }
}

fn required_fields<T: Validate>(req: &T) -> Result<()> {
    req.validate().map_err(|e| {
        debug!("Request validation failed: {}", e);
        Error::Validation(MISSING_FIELDS.to_string())
    })
}
