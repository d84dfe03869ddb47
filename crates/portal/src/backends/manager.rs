/// 存储后端管理器
///
/// 按存储技术分发请求；扩容时没有显式技术的旧请求按 PV 名称前缀推断

use common::{Error, Result, Technology};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::driver::VolumeBackend;

#[derive(Clone, Default)]
pub struct BackendManager {
    backends: HashMap<Technology, Arc<dyn VolumeBackend>>,
}

impl BackendManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册后端，同一技术后注册的覆盖先注册的
    pub fn register(&mut self, backend: Arc<dyn VolumeBackend>) {
        info!("Registering storage backend: {}", backend.technology());
        self.backends.insert(backend.technology(), backend);
    }

    /// 获取存储后端
    pub fn get(&self, technology: Technology) -> Result<Arc<dyn VolumeBackend>> {
        self.backends
            .get(&technology)
            .cloned()
            .ok_or_else(|| Error::Config(format!("No backend registered for {}", technology)))
    }

    /// 扩容时选择后端
    ///
    /// 显式指定的技术优先，但必须和 PV 名称前缀一致；未指定时按前缀判断
    pub fn for_existing_volume(
        &self,
        pv_name: &str,
        technology: Option<Technology>,
    ) -> Result<Arc<dyn VolumeBackend>> {
        let by_prefix = Technology::from_pv_name(pv_name);

        let technology = match (technology, by_prefix) {
            (Some(explicit), Some(prefix)) if explicit != prefix => {
                return Err(Error::Validation(format!(
                    "Volume {} is not a {} volume",
                    pv_name, explicit
                )));
            }
            (Some(explicit), _) => explicit,
            (None, Some(prefix)) => {
                debug!("Selected {} backend for {} by name prefix", prefix, pv_name);
                prefix
            }
            (None, None) => {
                return Err(Error::Validation(format!("Wrong pv name: {}", pv_name)));
            }
        };

        self.get(technology)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeBackend;
    use super::*;

    fn manager() -> BackendManager {
        let mut manager = BackendManager::new();
        manager.register(Arc::new(FakeBackend::new(Technology::Gluster)));
        manager.register(Arc::new(FakeBackend::new(Technology::Nfs)));
        manager
    }

    #[test]
    fn test_prefix_fallback() {
        let m = manager();
        assert_eq!(
            m.for_existing_volume("gl-team-pv1", None).unwrap().technology(),
            Technology::Gluster
        );
        assert_eq!(
            m.for_existing_volume("nfs-team-data", None).unwrap().technology(),
            Technology::Nfs
        );
        assert!(matches!(
            m.for_existing_volume("team-pv1", None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_explicit_technology_is_authoritative() {
        let m = manager();
        assert_eq!(
            m.for_existing_volume("legacy-volume", Some(Technology::Nfs))
                .unwrap()
                .technology(),
            Technology::Nfs
        );
        assert!(matches!(
            m.for_existing_volume("gl-team-pv1", Some(Technology::Nfs)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_missing_backend() {
        let m = BackendManager::new();
        assert!(matches!(m.get(Technology::Gluster), Err(Error::Config(_))));
    }
}
