/// 外部系统客户端
///
/// OpenShift API 和 NFS 工作流引擎

pub mod objects;
pub mod openshift;
pub mod workflow;

pub use openshift::{OpenShiftClient, PlatformApi, ProjectAdmins};
pub use workflow::{HttpWorkflowClient, WorkflowApi};
