/// 统一错误类型
///
/// 按照调用方是否能自行处理来划分：校验、权限、容量类错误原样返回给用户；
/// 命令执行和上游服务错误只在服务端日志中保留细节

use thiserror::Error;

/// 返回给用户的通用错误信息
pub const GENERIC_API_ERROR: &str =
    "Error calling a backend API. Please open a ticket with the platform team.";

/// 本地命令执行失败时返回给用户的信息
pub const COMMAND_EXECUTION_ERROR: &str =
    "Error running the storage commands. Please open a ticket with the platform team.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("You have no admin rights on the project. Current admins are: {}", .admins.join(", "))]
    Permission { admins: Vec<String> },

    #[error("Command execution failed: {0}")]
    Execution(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    /// 另一个服务已经按本模块规则生成、可以直接展示给用户的信息
    #[error("{0}")]
    Relayed(String),

    #[error("Usage of volume {volume} is {used_percent:.1}%, threshold is {threshold}%")]
    Capacity {
        volume: String,
        used_percent: f64,
        threshold: u8,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// 可以跨越 API 边界的错误信息
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(_) | Error::Permission { .. } | Error::Capacity { .. } => {
                self.to_string()
            }
            Error::NotFound(msg) | Error::Relayed(msg) => msg.clone(),
            Error::Execution(_) => COMMAND_EXECUTION_ERROR.to_string(),
            Error::Upstream(detail) if !detail.is_empty() => {
                format!("{} Response: {}", GENERIC_API_ERROR, detail)
            }
            Error::Timeout(_) => {
                "The backend did not answer in time. Please retry later.".to_string()
            }
            _ => GENERIC_API_ERROR.to_string(),
        }
    }

    /// 用户重试有可能成功的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

/// 统一结果类型
pub type Result<T> = std::result::Result<T, Error>;
