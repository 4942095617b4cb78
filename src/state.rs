use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::progression::service::ProgressionService;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    service: Arc<ProgressionService>,
    config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, service: Arc<ProgressionService>, config: &Config) -> Self {
        Self {
            store,
            service,
            config: Arc::new(config.clone()),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn progression(&self) -> &ProgressionService {
        &self.service
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::Catalogs;
    use crate::progression::config::EngineConfig;

    use super::*;

    #[test]
    fn clones_share_the_store() {
        let cfg = Config::from_env();
        let tmp = tempfile::tempdir().expect("tempdir");
        let store =
            Arc::new(Store::open(tmp.path().join("state.sled").to_str().unwrap()).unwrap());
        let service = Arc::new(
            ProgressionService::new(
                store.clone(),
                Catalogs::load_builtin().unwrap(),
                &EngineConfig::default(),
            )
            .unwrap(),
        );
        let state = AppState::new(store, service, &cfg);
        let cloned = state.clone();

        assert!(std::ptr::eq(state.store(), cloned.store()));
        assert!(std::ptr::eq(state.store(), state.progression().store()));
    }
}
