/// 配置管理
///
/// 所有配置来自环境变量（可以由 .env 文件提供），缺少必填项时启动失败

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    pub max_volume_gb: u64,

    pub openshift_api: String,
    pub openshift_token: String,
    /// OpenShift API 使用自签名证书时打开
    #[serde(default)]
    pub openshift_insecure_tls: bool,

    pub gluster_api_url: String,
    pub gluster_secret: String,
    /// Endpoints 中登记的 Gluster 节点地址，逗号分隔
    pub gluster_ips: String,

    pub nfs_api_url: String,
    pub nfs_api_user: String,
    pub nfs_api_secret: String,
    #[serde(default = "default_nfs_poll_interval_ms")]
    pub nfs_poll_interval_ms: u64,
    #[serde(default = "default_nfs_poll_timeout_secs")]
    pub nfs_poll_timeout_secs: u64,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    pub jwt_secret: String,
}

fn default_server_port() -> u16 {
    3000
}

fn default_nfs_poll_interval_ms() -> u64 {
    1000
}

fn default_nfs_poll_timeout_secs() -> u64 {
    600
}

fn default_http_timeout_secs() -> u64 {
    60
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg: Config = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("failed to read configuration from environment")?
            .try_deserialize()
            .context("invalid or missing configuration")?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_volume_gb == 0 {
            anyhow::bail!("MAX_VOLUME_GB must be a positive integer");
        }
        if self.gluster_ip_list().is_empty() {
            anyhow::bail!("GLUSTER_IPS must contain at least one address");
        }
        for (name, value) in [
            ("OPENSHIFT_API", &self.openshift_api),
            ("OPENSHIFT_TOKEN", &self.openshift_token),
            ("GLUSTER_API_URL", &self.gluster_api_url),
            ("GLUSTER_SECRET", &self.gluster_secret),
            ("NFS_API_URL", &self.nfs_api_url),
            ("JWT_SECRET", &self.jwt_secret),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }
        if self.nfs_poll_interval_ms == 0 {
            anyhow::bail!("NFS_POLL_INTERVAL_MS must be positive");
        }
        Ok(())
    }

    pub fn gluster_ip_list(&self) -> Vec<String> {
        self.gluster_ips
            .split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn nfs_poll_interval(&self) -> Duration {
        Duration::from_millis(self.nfs_poll_interval_ms)
    }

    pub fn nfs_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.nfs_poll_timeout_secs)
    }
}
