/// 节点指标

pub mod collector;

pub use collector::MetricsCollector;
