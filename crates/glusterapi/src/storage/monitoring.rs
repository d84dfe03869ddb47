/// Brick 容量监控
///
/// 每次检查都重新执行 df，结果不缓存

use common::models::VolumeUsage;
use common::{Error, Result};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::executor::CommandRunner;
use super::volume::volume_mount_point;
use crate::metrics::MetricsCollector;

pub struct CapacityMonitor {
    runner: Arc<dyn CommandRunner>,
    metrics: Arc<MetricsCollector>,
    base_path: String,
}

impl CapacityMonitor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        metrics: Arc<MetricsCollector>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            metrics,
            base_path: base_path.into(),
        }
    }

    /// 读取卷挂载点 `<base_path>/<project>/pv<N>` 上文件系统的使用量
    ///
    /// 按挂载点而不是设备名匹配：device-mapper 会把名字里的 `-` 写成 `--`
    pub async fn get_volume_usage(&self, volume_id: &str) -> Result<VolumeUsage> {
        let mount_point = volume_mount_point(&self.base_path, volume_id)?;

        let command = format!("df --output=size,used,source,target {}", mount_point);
        let output = self.runner.run(&command).await.map_err(|e| {
            error!("Error reading usage of volume {}: {}", volume_id, e);
            Error::Execution(format!("df failed for {}", volume_id))
        })?;

        // 挂载点不存在时 df 报告的是上层目录所在的文件系统
        let usage = parse_df_output(&output, &mount_point).ok_or_else(|| {
            error!(
                "Volume {} is not mounted at {}: {:?}",
                volume_id, mount_point, output
            );
            Error::Execution(format!("{} is not mounted", mount_point))
        })?;

        debug!(
            "Volume {} uses {} of {} KB",
            volume_id, usage.used_kilo_bytes, usage.total_kilo_bytes
        );
        Ok(usage)
    }

    /// 使用率达到阈值时返回 Capacity 错误
    pub async fn check_volume_usage(&self, volume_id: &str, threshold: u8) -> Result<()> {
        let usage = self.get_volume_usage(volume_id).await?;

        let used_percent = usage.used_percent().ok_or_else(|| {
            error!("Volume {} reports a total size of 0", volume_id);
            Error::Execution(format!("volume {} has no capacity", volume_id))
        })?;
        self.metrics.set_brick_usage(volume_id, used_percent);

        if used_percent >= f64::from(threshold) {
            warn!(
                "Volume {} is above threshold: {:.1}% >= {}%",
                volume_id, used_percent, threshold
            );
            return Err(Error::Capacity {
                volume: volume_id.to_string(),
                used_percent,
                threshold,
            });
        }

        Ok(())
    }
}

/// 解析 `total used device target`，跳过表头，只取挂载在 `mount_point` 上的那一行
fn parse_df_output(output: &str, mount_point: &str) -> Option<VolumeUsage> {
    output.lines().find_map(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [total, used, _device, target] if *target == mount_point => Some(VolumeUsage {
                total_kilo_bytes: total.parse().ok()?,
                used_kilo_bytes: used.parse().ok()?,
            }),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::executor::testing::RecordingRunner;

    const DF_HEADER: &str = "1K-blocks  Used Filesystem                            Mounted on";

    fn monitor(output: &str) -> (CapacityMonitor, Arc<RecordingRunner>, Arc<MetricsCollector>) {
        let runner = Arc::new(RecordingRunner::with_outputs(&[output]));
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        (
            CapacityMonitor::new(runner.clone(), metrics.clone(), "/gluster/"),
            runner,
            metrics,
        )
    }

    fn df(device: &str, total: u64, used: u64, target: &str) -> String {
        format!("{}\n{:>9} {:>8} {} {}\n", DF_HEADER, total, used, device, target)
    }

    #[tokio::test]
    async fn test_get_volume_usage() {
        let (m, runner, _) = monitor(&df(
            "/dev/mapper/vg_gluster-lv_project_pv1",
            49664,
            2864,
            "/gluster/project/pv1",
        ));

        let usage = m.get_volume_usage("project_pv1").await.unwrap();

        assert_eq!(usage.total_kilo_bytes, 49664);
        assert_eq!(usage.used_kilo_bytes, 2864);
        assert_eq!(
            runner.commands(),
            vec!["df --output=size,used,source,target /gluster/project/pv1"]
        );
    }

    #[tokio::test]
    async fn test_hyphenated_project() {
        // device-mapper 把 `my-team` 写成 `my--team`
        let (m, runner, metrics) = monitor(&df(
            "/dev/mapper/vg_gluster-lv_my--team_pv1",
            49664,
            49555,
            "/gluster/my-team/pv1",
        ));

        let err = m.check_volume_usage("my-team_pv1", 20).await.unwrap_err();

        assert!(matches!(err, Error::Capacity { threshold: 20, .. }));
        assert_eq!(
            runner.commands(),
            vec!["df --output=size,used,source,target /gluster/my-team/pv1"]
        );
        assert!(metrics.render().unwrap().contains("volume=\"my-team_pv1\""));
    }

    #[tokio::test]
    async fn test_check_volume_usage_ok() {
        let (m, _, metrics) = monitor(&df(
            "/dev/mapper/vg_gluster-lv_project_pv1",
            49664,
            2864,
            "/gluster/project/pv1",
        ));

        m.check_volume_usage("project_pv1", 20).await.unwrap();

        assert!(metrics.render().unwrap().contains("volume=\"project_pv1\""));
    }

    #[tokio::test]
    async fn test_check_volume_usage_error() {
        let (m, _, _) = monitor(&df(
            "/dev/mapper/vg_gluster-lv_project_pv1",
            49664,
            49555,
            "/gluster/project/pv1",
        ));

        let err = m.check_volume_usage("project_pv1", 20).await.unwrap_err();

        assert!(matches!(err, Error::Capacity { threshold: 20, .. }));
    }

    #[tokio::test]
    async fn test_zero_total_is_not_usable() {
        let (m, _, _) = monitor(&df("/dev/mapper/x", 0, 0, "/gluster/project/pv1"));
        let err = m.check_volume_usage("project_pv1", 20).await.unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
    }

    #[tokio::test]
    async fn test_not_mounted() {
        // 卷未挂载时 df 返回上层目录的文件系统，不能算作这个卷的使用量
        let (m, _, _) = monitor(&df("/dev/mapper/rhel-root", 49664, 49555, "/"));
        assert!(matches!(
            m.get_volume_usage("team_pv1").await,
            Err(Error::Execution(_))
        ));

        let (m, _, _) = monitor("");
        assert!(m.get_volume_usage("team_pv9").await.is_err());
    }

    #[tokio::test]
    async fn test_other_project_with_same_suffix() {
        let (m, _, _) = monitor(&df(
            "/dev/mapper/vg_gluster-lv_foo--team_pv1",
            49664,
            49555,
            "/gluster/foo-team/pv1",
        ));
        assert!(matches!(
            m.get_volume_usage("team_pv1").await,
            Err(Error::Execution(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_shell_characters_in_volume_name() {
        let (m, runner, _) = monitor("");
        for volume_id in ["pv1|.*", "team_pv1; rm -rf /", "pv1"] {
            assert!(matches!(
                m.get_volume_usage(volume_id).await,
                Err(Error::Validation(_))
            ));
        }
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_parse_df_output() {
        assert_eq!(
            parse_df_output(
                "1K-blocks Used Filesystem Mounted on\n  100 \t 40   /dev/x  /g/p/pv1\n",
                "/g/p/pv1"
            ),
            Some(VolumeUsage {
                total_kilo_bytes: 100,
                used_kilo_bytes: 40
            })
        );
        assert_eq!(parse_df_output("100 40 /dev/x /g/p/pv10", "/g/p/pv1"), None);
        assert_eq!(parse_df_output("/dev/x 100 40 /g/p/pv1", "/g/p/pv1"), None);
        assert_eq!(parse_df_output("100 40 /g/p/pv1", "/g/p/pv1"), None);
    }
}
