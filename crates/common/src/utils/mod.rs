/// 卷大小策略
///
/// 解析 "500M" / "10G" 这类大小字符串，并按存储技术检查上下限

use std::fmt;

use crate::errors::{Error, Result};

/// M 单位的最小值
pub const MIN_MB: u64 = 500;

/// M 单位的最大值，更大的卷需要用 G 表示
pub const MAX_MB: u64 = 1024;

const WRONG_SIZE_FORMAT: &str =
    "Invalid size. Format must be a number followed by M or G (e.g. 500M).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Megabytes,
    Gigabytes,
}

impl SizeUnit {
    fn suffix(&self) -> char {
        match self {
            SizeUnit::Megabytes => 'M',
            SizeUnit::Gigabytes => 'G',
        }
    }
}

/// 已解析的卷大小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub value: u64,
    pub unit: SizeUnit,
}

impl Size {
    /// 只检查格式：正整数加 M/G 后缀
    pub fn parse(size: &str) -> Result<Self> {
        let unit = match size.chars().last() {
            Some('M') => SizeUnit::Megabytes,
            Some('G') => SizeUnit::Gigabytes,
            _ => return Err(Error::Validation(WRONG_SIZE_FORMAT.to_string())),
        };

        let digits = &size[..size.len() - 1];
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::Validation(WRONG_SIZE_FORMAT.to_string()));
        }

        let value: u64 = digits
            .parse()
            .map_err(|_| Error::Validation(WRONG_SIZE_FORMAT.to_string()))?;
        if value == 0 {
            return Err(Error::Validation(WRONG_SIZE_FORMAT.to_string()));
        }

        Ok(Self { value, unit })
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// 大小策略，max_gb 来自外部配置
#[derive(Debug, Clone, Copy)]
pub struct SizePolicy {
    max_gb: u64,
}

impl SizePolicy {
    pub fn new(max_gb: u64) -> Result<Self> {
        if max_gb == 0 {
            return Err(Error::Config(
                "MAX_VOLUME_GB must be a positive integer".to_string(),
            ));
        }
        Ok(Self { max_gb })
    }

    pub fn max_gb(&self) -> u64 {
        self.max_gb
    }

    /// 检查大小格式和范围
    ///
    /// nfs 只允许 G 单位，其他技术（包括扩容时的 "any"）允许 M 或 G
    pub fn validate(&self, size: &str, technology: &str) -> Result<Size> {
        let parsed = Size::parse(size)?;

        if technology == "nfs" && parsed.unit != SizeUnit::Gigabytes {
            return Err(Error::Validation(WRONG_SIZE_FORMAT.to_string()));
        }

        match parsed.unit {
            SizeUnit::Megabytes => {
                if parsed.value < MIN_MB {
                    return Err(self.limit_error());
                }
                if parsed.value > MAX_MB {
                    return Err(Error::Validation(
                        "Your size is too large for 'M'. Please give the size as an integer in 'G'"
                            .to_string(),
                    ));
                }
            }
            // TODO: enforce a minimum for G sizes once storage ops agrees on one
            SizeUnit::Gigabytes => {
                if parsed.value > self.max_gb {
                    return Err(self.limit_error());
                }
            }
        }

        Ok(parsed)
    }

    /// 只检查格式和上限
    ///
    /// 存储节点上使用：最小值由 Portal 保证，节点只拒绝超出池容量策略的请求
    pub fn validate_max(&self, size: &str) -> Result<Size> {
        let parsed = Size::parse(size)?;

        let too_large = match parsed.unit {
            SizeUnit::Megabytes => parsed.value > MAX_MB,
            SizeUnit::Gigabytes => parsed.value > self.max_gb,
        };
        if too_large {
            return Err(self.limit_error());
        }

        Ok(parsed)
    }

    fn limit_error(&self) -> Error {
        Error::Validation(format!(
            "Size not allowed. Minimum size: {}M (1G for NFS). Maximum sizes are: M: {}, G: {}",
            MIN_MB, MAX_MB, self.max_gb
        ))
    }
}
