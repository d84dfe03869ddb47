/// 配置管理

use anyhow::Context;
use std::net::Ipv4Addr;

use crate::storage::LvmSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub node_name: String,
    /// 本机地址，未设置时从网卡探测
    pub node_ip: Option<Ipv4Addr>,
    pub port: u16,
    /// 管理接口 basic auth 密码，对端之间也使用同一个
    pub secret: String,
    pub vg_name: String,
    pub pool_name: String,
    pub base_path: String,
    pub replicas: u32,
    pub max_volume_gb: u64,
    /// 容量检查默认阈值（百分比）
    pub capacity_threshold: u8,
    pub peer_timeout_secs: u64,
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> anyhow::Result<Self> {
        let node_name = std::env::var("NODE_NAME").unwrap_or_else(|_| {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string())
        });

        let node_ip = match std::env::var("NODE_IP") {
            Ok(ip) => Some(ip.parse().context("NODE_IP must be an IPv4 address")?),
            Err(_) => None,
        };

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("PORT must be a port number")?;

        let secret = required("SECRET")?;
        let vg_name = required("VG_NAME")?;

        let pool_name = std::env::var("POOL_NAME").unwrap_or_default();
        let base_path = std::env::var("BASE_PATH").unwrap_or_default();

        let replicas = required("REPLICAS")?
            .parse()
            .context("REPLICAS must be a positive integer")?;

        let max_volume_gb = required("MAX_VOLUME_GB")?
            .parse()
            .context("MAX_VOLUME_GB must be a positive integer")?;

        let capacity_threshold = std::env::var("CAPACITY_THRESHOLD")
            .unwrap_or_else(|_| "90".to_string())
            .parse()
            .context("CAPACITY_THRESHOLD must be a percentage")?;

        let peer_timeout_secs = std::env::var("PEER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("PEER_TIMEOUT_SECS must be a number of seconds")?;

        let config = Self {
            node_name,
            node_ip,
            port,
            secret,
            vg_name,
            pool_name,
            base_path,
            replicas,
            max_volume_gb,
            capacity_threshold,
            peer_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.replicas == 0 {
            anyhow::bail!("REPLICAS must be at least 1");
        }
        if self.max_volume_gb == 0 {
            anyhow::bail!("MAX_VOLUME_GB must be a positive integer");
        }
        if self.capacity_threshold == 0 || self.capacity_threshold > 100 {
            anyhow::bail!("CAPACITY_THRESHOLD must be between 1 and 100");
        }
        Ok(())
    }

    pub fn lvm_settings(&self) -> LvmSettings {
        LvmSettings {
            vg_name: self.vg_name.clone(),
            pool_name: self.pool_name.clone(),
            base_path: self.base_path.clone(),
            replicas: self.replicas,
        }
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => anyhow::bail!("{} must be set", name),
    }
}
