use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use rating_backend::config::{Config, WorkerConfig};
use rating_backend::routes::build_router;
use rating_backend::state::AppState;
use rating_backend::store::files::DataPaths;
use rating_backend::store::Store;

pub const BOOTSTRAP_ADMIN: &str = "root";

/// Problem file seeded for every test app, in title/link line pairs.
const PROBLEM_FILE: &str = "\
CF1A
https://codeforces.com/problemset/problem/1/A
CF2B
https://codeforces.com/problemset/problem/2/B
ABC100-D
https://atcoder.jp/contests/abc100/tasks/abc100_d
";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn paths(&self) -> DataPaths {
        DataPaths::new(&self.config.data_dir)
    }

    /// Reopen the data directory from disk, as a restarted process would.
    pub fn reopen_store(&self) -> Store {
        let sled_path = self.temp_dir.path().join("reopened.sled");
        Store::open(
            self.paths(),
            sled_path.to_str().expect("utf-8 path"),
            BOOTSTRAP_ADMIN,
        )
        .expect("reopen store")
    }
}

pub async fn spawn_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let data_dir = temp_dir.path().join("data");
    std::fs::create_dir_all(&data_dir).expect("create data dir");
    std::fs::write(data_dir.join("problem.txt"), PROBLEM_FILE).expect("seed problems");

    // 直接构造 Config，避免 set_var 在多线程测试中互相干扰
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        data_dir: data_dir.to_string_lossy().to_string(),
        sled_path: temp_dir
            .path()
            .join("sessions.sled")
            .to_string_lossy()
            .to_string(),
        static_dir: temp_dir.path().join("static").to_string_lossy().to_string(),
        jwt_secret: format!("integration-test-jwt-secret-{}", uuid::Uuid::new_v4()),
        jwt_expires_in_hours: 24,
        cors_origin: "http://localhost:5173".to_string(),
        bootstrap_admin: BOOTSTRAP_ADMIN.to_string(),
        worker: WorkerConfig {
            is_leader: false,
            autosave_interval_secs: 30,
            autosave_check_secs: 5,
        },
    };

    let store = Store::open(
        DataPaths::new(&config.data_dir),
        &config.sled_path,
        &config.bootstrap_admin,
    )
    .expect("open store");
    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(Arc::new(store), &config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        temp_dir,
    }
}
