/// Gluster 集群成员发现

use common::{Error, Result};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tracing::{debug, error};

use crate::storage::executor::CommandRunner;

pub struct PeerDiscovery {
    runner: Arc<dyn CommandRunner>,
    /// 配置中指定的本机地址，优先于网卡探测
    node_ip: Option<Ipv4Addr>,
}

impl PeerDiscovery {
    pub fn new(runner: Arc<dyn CommandRunner>, node_ip: Option<Ipv4Addr>) -> Self {
        Self { runner, node_ip }
    }

    /// 按 `gluster peer status` 输出顺序返回所有对端主机名
    pub async fn peer_servers(&self) -> Result<Vec<String>> {
        let output = self.runner.run("gluster peer status").await.map_err(|e| {
            error!("Error getting gluster peer status: {}", e);
            Error::Execution("gluster peer status failed".to_string())
        })?;

        let peers = parse_peer_hostnames(&output);
        debug!("Found gluster peers: {:?}", peers);
        Ok(peers)
    }

    /// 本机对外可达的 IPv4 地址
    pub fn local_server_ip(&self) -> Result<Ipv4Addr> {
        if let Some(ip) = self.node_ip {
            return Ok(ip);
        }

        detect_local_ipv4().ok_or_else(|| {
            error!("Unable to find a non-loopback IPv4 address on this node");
            Error::Config("no usable IPv4 address found, set NODE_IP".to_string())
        })
    }
}

/// 提取所有 `Hostname:` 字段，保留顺序和重复项
pub fn parse_peer_hostnames(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Hostname:"))
        .map(|host| host.trim().to_string())
        .filter(|host| !host.is_empty())
        .collect()
}

fn detect_local_ipv4() -> Option<Ipv4Addr> {
    if let Ok(interfaces) = local_ip_address::list_afinet_netifas() {
        for (_, ip) in interfaces {
            if let IpAddr::V4(ipv4) = ip {
                if ipv4.is_loopback() || ipv4.is_link_local() {
                    continue;
                }
                return Some(ipv4);
            }
        }
    }

    match local_ip_address::local_ip() {
        Ok(IpAddr::V4(ipv4)) if !ipv4.is_loopback() => Some(ipv4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::executor::testing::RecordingRunner;

    #[tokio::test]
    async fn test_peer_servers_in_order() {
        let ip1 = "192.168.125.236";
        let ip2 = "192.168.125.238";
        let runner = Arc::new(RecordingRunner::with_outputs(&[&format!(
            "Hostname: {}\n\t\t\t\t\t\t  Hostname: {}",
            ip1, ip2
        )]));
        let discovery = PeerDiscovery::new(runner.clone(), None);

        let servers = discovery.peer_servers().await.unwrap();

        assert_eq!(servers, vec![ip1, ip2]);
        assert_eq!(runner.commands(), vec!["gluster peer status"]);
    }

    #[test]
    fn test_parse_real_peer_status() {
        let output = "Number of Peers: 2\n\n\
                      Hostname: gluster02\n\
                      Uuid: 3a1d6b8e-6f0c-4a47-9f1e-6a2c1d3e0b11\n\
                      State: Peer in Cluster (Connected)\n\n\
                      Hostname: gluster03\n\
                      Uuid: 0b9e7a52-1c44-4d0e-8a8f-3c2e4f5a6b22\n\
                      State: Peer in Cluster (Connected)\n";
        assert_eq!(parse_peer_hostnames(output), vec!["gluster02", "gluster03"]);
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        let output = "Hostname: a\nHostname: b\nHostname: a\n";
        assert_eq!(parse_peer_hostnames(output), vec!["a", "b", "a"]);
        assert!(parse_peer_hostnames("Number of Peers: 0").is_empty());
    }

    #[test]
    fn test_configured_ip_wins() {
        let discovery = PeerDiscovery::new(
            Arc::new(RecordingRunner::default()),
            Some(Ipv4Addr::new(10, 0, 0, 5)),
        );
        assert_eq!(discovery.local_server_ip().unwrap(), Ipv4Addr::new(10, 0, 0, 5));
    }

    #[test]
    fn test_detected_ip_is_usable_ipv4() {
        // CI 容器里可能只有 loopback
        if let Some(ip) = detect_local_ipv4() {
            assert!(!ip.is_loopback());
        }
    }
}
