/// Gluster 卷管理
///
/// 创建流程：
/// 1. 在本机分配下一个空闲的 pv 编号（加锁，直到逻辑卷真正创建出来）
/// 2. 本机执行固定的命令序列：逻辑卷、xfs 文件系统、fstab、挂载、brick 目录
/// 3. 通过对端 API 让所有对端创建同样的逻辑卷
/// 4. 创建并启动 replica 卷
///
/// 第 3、4 步失败时不会回滚第 2 步在本机做的修改

use common::models::{CreateLvCommand, GrowVolumeCommand};
use common::{Error, Result, SizePolicy};
use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::executor::{execute_commands_locally, CommandRunner};
use crate::cluster::{PeerApi, PeerDiscovery};

/// 本机 LVM 布局
#[derive(Debug, Clone)]
pub struct LvmSettings {
    pub vg_name: String,
    pub pool_name: String,
    /// 挂载点根目录，可以为空
    pub base_path: String,
    pub replicas: u32,
}

pub struct GlusterVolumeManager {
    settings: LvmSettings,
    size_policy: SizePolicy,
    runner: Arc<dyn CommandRunner>,
    peers: PeerDiscovery,
    peer_api: Arc<dyn PeerApi>,
    /// 串行化 pv 编号分配
    allocation_lock: Mutex<()>,
}

impl GlusterVolumeManager {
    pub fn new(
        settings: LvmSettings,
        size_policy: SizePolicy,
        runner: Arc<dyn CommandRunner>,
        peers: PeerDiscovery,
        peer_api: Arc<dyn PeerApi>,
    ) -> Self {
        Self {
            settings,
            size_policy,
            runner,
            peers,
            peer_api,
            allocation_lock: Mutex::new(()),
        }
    }

    /// 创建新卷，返回卷标识 `<project>_pv<N>`
    pub async fn create_volume(&self, project: &str, size: &str) -> Result<String> {
        if project.is_empty() || size.is_empty() {
            return Err(Error::Validation(
                "Not all input values provided (project, size)".to_string(),
            ));
        }
        validate_project(project)?;
        self.size_policy.validate_max(size)?;

        let peers = self.peers.peer_servers().await?;
        let local_ip = self.peers.local_server_ip()?;

        let (volume_id, mount_point) = {
            let _guard = self.allocation_lock.lock().await;

            let number = self.next_pv_number(project).await?;
            let volume_id = format!("{}_pv{}", project, number);
            let mount_point = self.mount_point(project, number);
            info!("Allocated volume {} at {}", volume_id, mount_point);

            self.create_lv(&volume_id, size, &mount_point).await?;
            (volume_id, mount_point)
        };

        let cmd = CreateLvCommand {
            lv_name: volume_id.clone(),
            size: size.to_string(),
            mount_point: mount_point.clone(),
        };
        try_join_all(peers.iter().map(|peer| self.peer_api.create_lv(peer, &cmd)))
            .await
            .map_err(|e| {
                error!(
                    "Creating lv {} on peers failed, local lv is kept: {}",
                    volume_id, e
                );
                e
            })?;

        self.create_gluster_volume(&volume_id, &mount_point, local_ip, &peers)
            .await?;

        info!("Created gluster volume vol_{}", volume_id);
        Ok(volume_id)
    }

    /// 扩容本机和所有对端上的逻辑卷
    pub async fn grow_volume(&self, pv_name: &str, new_size: &str) -> Result<()> {
        if pv_name.is_empty() || new_size.is_empty() {
            return Err(Error::Validation(
                "Not all input values provided (pvName, newSize)".to_string(),
            ));
        }
        validate_volume_id(pv_name)?;
        self.size_policy.validate_max(new_size)?;

        let peers = self.peers.peer_servers().await?;

        self.grow_lv(pv_name, new_size).await?;

        let cmd = GrowVolumeCommand {
            pv_name: pv_name.to_string(),
            new_size: new_size.to_string(),
        };
        try_join_all(peers.iter().map(|peer| self.peer_api.grow_lv(peer, &cmd))).await?;

        info!("Grew volume {} to {}", pv_name, new_size);
        Ok(())
    }

    /// 本机创建逻辑卷（本节点创建流程和对端 `/sec/lv` 调用共用）
    pub async fn create_lv(&self, volume_id: &str, size: &str, mount_point: &str) -> Result<()> {
        validate_volume_id(volume_id)?;
        validate_mount_point(&self.settings.base_path, mount_point)?;
        self.size_policy.validate_max(size)?;

        let commands = lv_create_commands(&self.settings, volume_id, size, mount_point);
        execute_commands_locally(self.runner.as_ref(), &commands).await
    }

    /// 本机扩容逻辑卷和文件系统
    pub async fn grow_lv(&self, volume_id: &str, new_size: &str) -> Result<()> {
        validate_volume_id(volume_id)?;
        self.size_policy.validate_max(new_size)?;

        let commands = lv_grow_commands(&self.settings, volume_id, new_size);
        execute_commands_locally(self.runner.as_ref(), &commands).await
    }

    async fn create_gluster_volume(
        &self,
        volume_id: &str,
        mount_point: &str,
        local_ip: Ipv4Addr,
        peers: &[String],
    ) -> Result<()> {
        let brick = format!("{}/brick", mount_point);
        let bricks: Vec<String> = std::iter::once(local_ip.to_string())
            .chain(peers.iter().cloned())
            .map(|host| format!("{}:{}", host, brick))
            .collect();

        let commands = vec![
            format!(
                "gluster volume create vol_{} replica {} {}",
                volume_id,
                self.settings.replicas,
                bricks.join(" ")
            ),
            format!("gluster volume start vol_{}", volume_id),
        ];
        execute_commands_locally(self.runner.as_ref(), &commands).await
    }

    /// 第一个未被占用的编号（从 1 开始）
    async fn next_pv_number(&self, project: &str) -> Result<u32> {
        let output = self
            .runner
            .run(&format!("lvs --noheadings -o lv_name {}", self.settings.vg_name))
            .await
            .map_err(|e| {
                error!("Error listing logical volumes: {}", e);
                Error::Execution("lvs failed".to_string())
            })?;

        let used = used_pv_numbers(&output, project);
        Ok((1..).find(|n| !used.contains(n)).unwrap_or(1))
    }

    fn mount_point(&self, project: &str, number: u32) -> String {
        mount_point(&self.settings.base_path, project, number)
    }
}

fn mount_point(base_path: &str, project: &str, number: u32) -> String {
    format!("{}/{}/pv{}", base_path.trim_end_matches('/'), project, number)
}

/// 由卷标识 `<project>_pv<N>` 推出它在本节点上的挂载点
pub fn volume_mount_point(base_path: &str, volume_id: &str) -> Result<String> {
    let invalid = || Error::Validation(format!("Invalid volume name: {}", volume_id));

    let (project, number) = volume_id.rsplit_once("_pv").ok_or_else(invalid)?;
    if project.is_empty() || number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    validate_project(project)?;
    let number: u32 = number.parse().map_err(|_| invalid())?;

    Ok(mount_point(base_path, project, number))
}

fn device_path(settings: &LvmSettings, volume_id: &str) -> String {
    format!("/dev/{}/lv_{}", settings.vg_name, volume_id)
}

/// 创建逻辑卷的完整命令序列
pub fn lv_create_commands(
    settings: &LvmSettings,
    volume_id: &str,
    size: &str,
    mount_point: &str,
) -> Vec<String> {
    let device = device_path(settings, volume_id);
    let brick = format!("{}/brick", mount_point);

    vec![
        format!("mkdir -p {}", mount_point),
        format!(
            "lvcreate -V {} -T {}/{} -n lv_{}",
            size, settings.vg_name, settings.pool_name, volume_id
        ),
        format!("mkfs.xfs -i size=512 -n size=8192 {}", device),
        format!(
            "echo \"{} {} xfs rw,inode64,noatime,nouuid 1 2\" | tee -a /etc/fstab > /dev/null",
            device, mount_point
        ),
        format!("mount -o rw,inode64,noatime,nouuid {} {}", device, mount_point),
        format!("mkdir {}", brick),
        format!("semanage fcontext -a -t glusterd_brick_t {}", brick),
        format!("restorecon -Rv {}", brick),
        format!("chown nfsnobody.nfsnobody {}", brick),
        format!("chmod 777 {}", brick),
    ]
}

/// 扩容逻辑卷和 xfs 文件系统
pub fn lv_grow_commands(settings: &LvmSettings, volume_id: &str, new_size: &str) -> Vec<String> {
    let device = device_path(settings, volume_id);
    vec![
        format!("lvextend -L {} {}", new_size, device),
        format!("xfs_growfs {}", device),
    ]
}

/// 从 `lvs` 输出中找出项目已使用的 pv 编号
fn used_pv_numbers(lvs_output: &str, project: &str) -> BTreeSet<u32> {
    let prefix = format!("lv_{}_pv", project);
    lvs_output
        .split_whitespace()
        .filter_map(|name| name.strip_prefix(prefix.as_str()))
        .filter_map(|number| number.parse().ok())
        .collect()
}

/// 项目名会拼进 shell 命令，只允许 OpenShift 项目名的字符集
fn validate_project(project: &str) -> Result<()> {
    let valid = project
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !project.starts_with('-')
        && !project.ends_with('-');
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid project name: {}", project)))
    }
}

/// 卷标识格式：`<project>_pv<N>`（测试环境中也允许更短的名字）
fn validate_volume_id(volume_id: &str) -> Result<()> {
    let valid = !volume_id.is_empty()
        && volume_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid volume name: {}", volume_id)))
    }
}

/// 挂载点必须位于 `<base_path>/` 之下
fn validate_mount_point(base_path: &str, mount_point: &str) -> Result<()> {
    let under_base = mount_point
        .strip_prefix(base_path.trim_end_matches('/'))
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|rest| !rest.is_empty());
    let valid = under_base
        && !mount_point.contains("..")
        && mount_point
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid mount point: {}", mount_point)))
    }
}
