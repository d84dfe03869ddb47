/// OpenShift API 客户端
///
/// 创建 PV/PVC/Service/Endpoints，并读取项目的 admin 权限

use async_trait::async_trait;
use common::{Error, Result};
use k8s_openapi::api::core::v1::{Endpoints, PersistentVolume, PersistentVolumeClaim, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// 项目的 admin 用户和 operator 组成员（都已转成小写）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectAdmins {
    pub admins: Vec<String>,
    pub operators: Vec<String>,
}

impl ProjectAdmins {
    pub fn permits(&self, username: &str) -> bool {
        let username = username.to_lowercase();
        self.admins.iter().chain(self.operators.iter()).any(|u| *u == username)
    }
}

#[async_trait]
pub trait PlatformApi: Send + Sync + 'static {
    async fn create_persistent_volume(&self, pv: &PersistentVolume) -> Result<()>;

    async fn create_persistent_volume_claim(
        &self,
        project: &str,
        pvc: &PersistentVolumeClaim,
    ) -> Result<()>;

    /// 已存在（409）视为成功
    async fn create_service(&self, project: &str, service: &Service) -> Result<()>;

    /// 已存在（409）视为成功
    async fn create_endpoints(&self, project: &str, endpoints: &Endpoints) -> Result<()>;

    /// 项目中已有的 PVC 名称
    async fn list_pvc_names(&self, project: &str) -> Result<Vec<String>>;

    async fn project_admins(&self, project: &str) -> Result<ProjectAdmins>;
}

// OpenShift 3 授权相关的文档，k8s-openapi 中没有对应类型

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyBinding {
    #[serde(default)]
    role_bindings: Vec<NamedRoleBinding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamedRoleBinding {
    name: String,
    role_binding: RoleBinding,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleBinding {
    #[serde(default)]
    user_names: Option<Vec<String>>,
    #[serde(default)]
    group_names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Group {
    #[serde(default)]
    users: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    metadata: ObjectMeta,
}

const ADMIN_ROLE: &str = "admin";
const OPERATOR_GROUP: &str = "operator";

pub struct OpenShiftClient {
    client: Client,
    base_url: String,
    token: String,
}

impl OpenShiftClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        insecure_tls: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure_tls)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!("Calling {} {}", method, url);
        self.client.request(method, url).bearer_auth(&self.token)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        builder.send().await.map_err(|e| {
            error!("Error calling OpenShift API ({}): {}", what, e);
            Error::Upstream(String::new())
        })
    }

    /// POST 对象，allow_conflict 时 409 也算成功
    async fn create<T: Serialize + Sync>(
        &self,
        path: &str,
        object: &T,
        what: &str,
        allow_conflict: bool,
    ) -> Result<()> {
        let response = self
            .send(self.request(Method::POST, path).json(object), what)
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                info!("Created {}", what);
                Ok(())
            }
            StatusCode::CONFLICT if allow_conflict => {
                info!("{} already existed, skipping", what);
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                error!("Error creating {}: {} {}", what, status, body);
                Err(Error::Upstream(String::new()))
            }
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str, what: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path), what).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{} not found", what)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Error getting {}: {} {}", what, status, body);
            return Err(Error::Upstream(String::new()));
        }

        response.json().await.map_err(|e| {
            error!("Error parsing {}: {}", what, e);
            Error::Upstream(String::new())
        })
    }
}

#[async_trait]
impl PlatformApi for OpenShiftClient {
    async fn create_persistent_volume(&self, pv: &PersistentVolume) -> Result<()> {
        self.create("api/v1/persistentvolumes", pv, "persistent volume", false)
            .await
    }

    async fn create_persistent_volume_claim(
        &self,
        project: &str,
        pvc: &PersistentVolumeClaim,
    ) -> Result<()> {
        self.create(
            &format!("api/v1/namespaces/{}/persistentvolumeclaims", project),
            pvc,
            "persistent volume claim",
            false,
        )
        .await
    }

    async fn create_service(&self, project: &str, service: &Service) -> Result<()> {
        self.create(
            &format!("api/v1/namespaces/{}/services", project),
            service,
            "gluster service",
            true,
        )
        .await
    }

    async fn create_endpoints(&self, project: &str, endpoints: &Endpoints) -> Result<()> {
        self.create(
            &format!("api/v1/namespaces/{}/endpoints", project),
            endpoints,
            "gluster endpoints",
            true,
        )
        .await
    }

    async fn list_pvc_names(&self, project: &str) -> Result<Vec<String>> {
        let list: ItemList = self
            .get_json(
                &format!("api/v1/namespaces/{}/persistentvolumeclaims", project),
                "pvc list",
            )
            .await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|item| item.metadata.name)
            .collect())
    }

    async fn project_admins(&self, project: &str) -> Result<ProjectAdmins> {
        let bindings: PolicyBinding = self
            .get_json(
                &format!("oapi/v1/namespaces/{}/policybindings/:default", project),
                "policy bindings",
            )
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => {
                    info!("Project {} was not found", project);
                    Error::NotFound("The project does not exist".to_string())
                }
                other => other,
            })?;

        let mut result = ProjectAdmins::default();
        let mut has_operator_group = false;

        for binding in bindings.role_bindings.iter().filter(|b| b.name == ADMIN_ROLE) {
            let groups = binding.role_binding.group_names.iter().flatten();
            if groups.into_iter().any(|g| g.eq_ignore_ascii_case(OPERATOR_GROUP)) {
                has_operator_group = true;
            }
            result.admins.extend(
                binding
                    .role_binding
                    .user_names
                    .iter()
                    .flatten()
                    .map(|u| u.to_lowercase()),
            );
        }

        if has_operator_group {
            let group: Group = self
                .get_json(&format!("oapi/v1/groups/{}", OPERATOR_GROUP), "operator group")
                .await?;
            result.operators = group
                .users
                .unwrap_or_default()
                .into_iter()
                .map(|u| u.to_lowercase())
                .collect();
        }

        Ok(result)
    }
}
