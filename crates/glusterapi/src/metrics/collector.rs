/// 指标收集器
///
/// 使用 prometheus 记录 brick 使用率和卷操作次数，通过 `/metrics` 导出

use common::{Error, Result};
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

pub struct MetricsCollector {
    registry: Registry,
    brick_usage: GaugeVec,
    operations: IntCounterVec,
}

impl MetricsCollector {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let brick_usage = GaugeVec::new(
            Opts::new(
                "glusterapi_brick_usage_percent",
                "Used space of a brick in percent, updated on every capacity check",
            ),
            &["volume"],
        )
        .map_err(metrics_error)?;

        let operations = IntCounterVec::new(
            Opts::new(
                "glusterapi_volume_operations_total",
                "Volume operations handled by this node",
            ),
            &["operation", "result"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(brick_usage.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(operations.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            brick_usage,
            operations,
        })
    }

    pub fn set_brick_usage(&self, volume: &str, used_percent: f64) {
        self.brick_usage.with_label_values(&[volume]).set(used_percent);
    }

    /// 记录一次卷操作的结果
    pub fn record_operation<T>(&self, operation: &str, result: &Result<T>) {
        let outcome = if result.is_ok() { "success" } else { "error" };
        self.operations
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Prometheus 文本格式
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| Error::Other(e.into()))
    }
}

fn metrics_error(e: prometheus::Error) -> Error {
    Error::Other(anyhow::anyhow!("metrics: {}", e))
}
