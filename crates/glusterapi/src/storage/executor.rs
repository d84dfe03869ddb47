/// 本地命令执行器
///
/// 所有块设备操作都通过 `bash -c` 在本机执行，测试时用记录命令的替身替换

use async_trait::async_trait;
use common::{Error, Result};
use tokio::process::Command;
use tracing::{debug, error, info};

/// 命令执行接口
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    /// 执行单条 shell 命令，成功时返回标准输出
    async fn run(&self, command: &str) -> Result<String>;
}

/// 通过 bash 执行命令
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<String> {
        let output = Command::new("bash")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| Error::Execution(format!("Failed to spawn bash: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Execution(format!(
                "exit status {}, stdout: {}, stderr: {}",
                output.status,
                stdout.trim_end(),
                stderr.trim_end()
            )));
        }

        Ok(stdout)
    }
}

/// 按顺序执行一组命令，遇到第一条失败的命令即中止
///
/// 失败细节只写日志，返回给调用方的错误不包含命令和输出
pub async fn execute_commands_locally(runner: &dyn CommandRunner, commands: &[String]) -> Result<()> {
    info!("Got {} new commands to execute", commands.len());

    for (index, command) in commands.iter().enumerate() {
        match runner.run(command).await {
            Ok(stdout) => {
                debug!("Cmd: {} | StdOut: {}", command, stdout.trim_end());
            }
            Err(e) => {
                error!("Error executing command '{}': {}", command, e);
                return Err(Error::Execution(format!(
                    "command {} of {} failed",
                    index + 1,
                    commands.len()
                )));
            }
        }
    }

    Ok(())
}
