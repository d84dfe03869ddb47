/// Gluster 集群
///
/// 对端发现和对端节点 API 调用

pub mod client;
pub mod peers;

pub use client::{HttpPeerClient, PeerApi};
pub use peers::PeerDiscovery;
