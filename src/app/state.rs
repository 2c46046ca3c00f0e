// ==========================================
// OEE 分析引擎 - 应用状态
// ==========================================
// 职责: 装配共享连接、仓储、配置、分析服务与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{OeeApi, RateLimiter};
use crate::config::{defaults, ConfigManager, OeeConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{OeeAnalyticsEngine, SqliteOeeDataSource};
use crate::perf::install_sqlite_tracing;
use crate::repository::{
    DowntimeRepository, MachineMetricsRepository, MachineRepository, ProductRepository,
    ProductionRunRepository,
};

/// 数据库路径环境变量
pub const ENV_DB_PATH: &str = "OEE_ANALYTICS_DB_PATH";

/// 应用状态
///
/// 持有所有 API 实例和共享资源，由命令行或嵌入方创建一次后复用
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// OEE 分析 API
    pub oee_api: Arc<OeeApi>,

    /// 配置管理器（用于读写 config_kv）
    pub config_manager: Arc<ConfigManager>,

    /// 机台仓储（用于机台维护）
    pub machine_repo: Arc<MachineRepository>,

    /// 产品仓储
    pub product_repo: Arc<ProductRepository>,

    /// 生产批次仓储（用于数据录入）
    pub run_repo: Arc<ProductionRunRepository>,

    /// 停机记录仓储（用于数据录入）
    pub downtime_repo: Arc<DowntimeRepository>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 说明
    /// 1. 打开共享连接并建表
    /// 2. 初始化所有 Repository 与 ConfigManager
    /// 3. 按配置创建限流器
    /// 4. 创建分析服务与 API 实例
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        install_sqlite_tracing(&mut conn);
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let machine_repo = Arc::new(
            MachineRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建MachineRepository: {}", e))?,
        );
        let product_repo = Arc::new(
            ProductRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ProductRepository: {}", e))?,
        );
        let run_repo = Arc::new(
            ProductionRunRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ProductionRunRepository: {}", e))?,
        );
        let downtime_repo = Arc::new(
            DowntimeRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建DowntimeRepository: {}", e))?,
        );
        let metrics_repo = Arc::new(
            MachineMetricsRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建MachineMetricsRepository: {}", e))?,
        );

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化限流器
        // ==========================================
        let max_requests = config_manager
            .get_rate_limit_max_requests()
            .await
            .unwrap_or(defaults::RATE_LIMIT_MAX_REQUESTS);
        let window_secs = config_manager
            .get_rate_limit_window_secs()
            .await
            .unwrap_or(defaults::RATE_LIMIT_WINDOW_SECS);
        let rate_limiter = Arc::new(RateLimiter::new(
            max_requests,
            Duration::from_secs(window_secs),
        ));

        // ==========================================
        // 初始化分析服务与API
        // ==========================================
        let data_source = Arc::new(SqliteOeeDataSource::new(
            machine_repo.clone(),
            product_repo.clone(),
            run_repo.clone(),
            downtime_repo.clone(),
            metrics_repo,
        ));
        let config_reader: Arc<dyn OeeConfigReader> = config_manager.clone();
        let engine = Arc::new(OeeAnalyticsEngine::new(data_source, config_reader.clone()));
        let oee_api = Arc::new(OeeApi::new(engine, config_reader, Some(rate_limiter)));

        tracing::info!(
            rate_limit_max_requests = max_requests,
            rate_limit_window_secs = window_secs,
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            oee_api,
            config_manager,
            machine_repo,
            product_repo,
            run_repo,
            downtime_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 OEE_ANALYTICS_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(ENV_DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./oee_analytics.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("oee-analytics");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("oee_analytics.db");
        }
    }

    path.to_string_lossy().to_string()
}
