/// Storage Portal - 公共库
///
/// 提供 Portal 和 Gluster 节点服务共享的类型、错误处理、大小策略等

pub mod errors;
pub mod models;
pub mod utils;

// 重新导出常用类型
pub use errors::{Error, Result};
pub use models::Technology;
pub use utils::{Size, SizePolicy};
