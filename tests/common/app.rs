use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use bond_backend::catalog::Catalogs;
use bond_backend::config::{Config, EngineEnvConfig};
use bond_backend::progression::config::EngineConfig;
use bond_backend::progression::service::ProgressionService;
use bond_backend::routes::build_router;
use bond_backend::state::AppState;
use bond_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

/// 直接构造 Config，避免 set_var 在多线程测试中产生竞态
fn test_config(sled_path: String) -> Config {
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path,
        cors_origin: "http://localhost:5173".to_string(),
        engine: EngineEnvConfig {
            secondary_threshold: 7,
            devotional_unit_hours: 24,
            game_sample_size: 10,
            game_max_sample_size: 50,
        },
    }
}

pub async fn spawn_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("bond-test.sled");
    let config = test_config(sled_path.to_string_lossy().to_string());

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let catalogs = Catalogs::load_builtin().expect("builtin catalogs");
    let service = Arc::new(
        ProgressionService::new(
            store.clone(),
            catalogs,
            &EngineConfig::from_env(&config.engine),
        )
        .expect("progression service"),
    );
    let state = AppState::new(store, service, &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}
