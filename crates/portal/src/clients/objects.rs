/// OpenShift 存储对象构造
///
/// PV/PVC/Service/Endpoints 都使用 k8s-openapi 的类型，序列化时自带 apiVersion 和 kind

use common::models::constants::GLUSTER_CLUSTER_OBJECT;
use common::models::AccessMode;
use k8s_openapi::api::core::v1::{
    EndpointAddress, EndpointPort, EndpointSubset, Endpoints, GlusterfsPersistentVolumeSource,
    NFSVolumeSource, PersistentVolume, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeSpec, ResourceRequirements, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Gluster Service/Endpoints 使用的占位端口
const GLUSTER_PORT: i32 = 1;

/// PV 的后端存储
#[derive(Debug, Clone, PartialEq)]
pub enum PvSource {
    /// Gluster 卷路径（vol_<project>_pv<N>）
    Gluster { path: String },
    Nfs { server: String, path: String },
}

fn metadata(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn storage(size: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([("storage".to_string(), Quantity(size.to_string()))])
}

pub fn persistent_volume(
    pv_name: &str,
    size: &str,
    mode: AccessMode,
    source: &PvSource,
) -> PersistentVolume {
    let mut spec = PersistentVolumeSpec {
        capacity: Some(storage(size)),
        access_modes: Some(vec![mode.as_str().to_string()]),
        persistent_volume_reclaim_policy: Some("Retain".to_string()),
        ..Default::default()
    };

    match source {
        PvSource::Gluster { path } => {
            spec.glusterfs = Some(GlusterfsPersistentVolumeSource {
                endpoints: GLUSTER_CLUSTER_OBJECT.to_string(),
                path: path.clone(),
                read_only: Some(false),
                ..Default::default()
            });
        }
        PvSource::Nfs { server, path } => {
            spec.nfs = Some(NFSVolumeSource {
                server: server.clone(),
                path: path.clone(),
                ..Default::default()
            });
        }
    }

    PersistentVolume {
        metadata: metadata(pv_name),
        spec: Some(spec),
        ..Default::default()
    }
}

/// PVC 直接绑定到新建的 PV
pub fn persistent_volume_claim(
    pvc_name: &str,
    size: &str,
    mode: AccessMode,
    pv_name: &str,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: metadata(pvc_name),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![mode.as_str().to_string()]),
            resources: Some(ResourceRequirements {
                requests: Some(storage(size)),
                ..Default::default()
            }),
            volume_name: Some(pv_name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn gluster_service() -> Service {
    Service {
        metadata: metadata(GLUSTER_CLUSTER_OBJECT),
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                port: GLUSTER_PORT,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn gluster_endpoints(ips: &[String]) -> Endpoints {
    Endpoints {
        metadata: metadata(GLUSTER_CLUSTER_OBJECT),
        subsets: Some(vec![EndpointSubset {
            addresses: Some(
                ips.iter()
                    .map(|ip| EndpointAddress {
                        ip: ip.clone(),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ports: Some(vec![EndpointPort {
                port: GLUSTER_PORT,
                ..Default::default()
            }]),
            ..Default::default()
        }]),
    }
}
