// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时 SQLite 数据库组装 OeeApi，并提供数据准备入口
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use oee_analytics::api::{OeeApi, RateLimiter};
use oee_analytics::config::{ConfigManager, OeeConfigReader};
use oee_analytics::domain::{Machine, MachineDowntime, Product, ProductionRun};
use oee_analytics::engine::{Clock, OeeAnalyticsEngine, SqliteOeeDataSource};
use oee_analytics::logging;
use oee_analytics::repository::{
    DowntimeRepository, MachineMetricsRepository, MachineRepository, ProductRepository,
    ProductionRunRepository,
};
use tempfile::NamedTempFile;

#[path = "../test_helpers.rs"]
mod test_helpers;

pub use test_helpers::{assert_close, fixed_now, shift_end, shift_start};

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含 OeeApi 实例与各仓储（用于测试数据准备）
pub struct ApiTestEnv {
    pub db_path: String,
    pub oee_api: Arc<OeeApi>,
    pub config_manager: Arc<ConfigManager>,

    // Repository层（用于测试数据准备）
    pub machine_repo: Arc<MachineRepository>,
    pub product_repo: Arc<ProductRepository>,
    pub run_repo: Arc<ProductionRunRepository>,
    pub downtime_repo: Arc<DowntimeRepository>,
    pub metrics_repo: Arc<MachineMetricsRepository>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建不限流的测试环境（时钟固定在班次结束）
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(None, fixed_now)
    }

    /// 创建使用系统时钟的测试环境
    pub fn with_system_clock() -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(None, Utc::now)
    }

    /// 创建带限流的测试环境
    pub fn with_rate_limit(max_requests: u32) -> Result<Self, Box<dyn std::error::Error>> {
        let limiter = Arc::new(RateLimiter::new(max_requests, Duration::from_secs(60)));
        Self::build(Some(limiter), fixed_now)
    }

    fn build(
        rate_limiter: Option<Arc<RateLimiter>>,
        clock: Clock,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        logging::init_test();

        let (temp_file, db_path) = test_helpers::create_test_db()?;
        let conn = test_helpers::open_shared_connection(&db_path)?;

        let machine_repo = Arc::new(MachineRepository::from_connection(conn.clone())?);
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone())?);
        let run_repo = Arc::new(ProductionRunRepository::from_connection(conn.clone())?);
        let downtime_repo = Arc::new(DowntimeRepository::from_connection(conn.clone())?);
        let metrics_repo = Arc::new(MachineMetricsRepository::from_connection(conn.clone())?);
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone()).map_err(|e| e.to_string())?,
        );

        let data_source = Arc::new(SqliteOeeDataSource::new(
            machine_repo.clone(),
            product_repo.clone(),
            run_repo.clone(),
            downtime_repo.clone(),
            metrics_repo.clone(),
        ));
        let config: Arc<dyn OeeConfigReader> = config_manager.clone();
        let engine = Arc::new(
            OeeAnalyticsEngine::new(data_source, config.clone()).with_clock(clock),
        );
        let oee_api = Arc::new(OeeApi::new(engine, config, rate_limiter));

        Ok(Self {
            db_path,
            oee_api,
            config_manager,
            machine_repo,
            product_repo,
            run_repo,
            downtime_repo,
            metrics_repo,
            _temp_file: temp_file,
        })
    }

    // ==========================================
    // 数据准备
    // ==========================================

    pub fn add_machine(&self, machine: Machine) {
        self.machine_repo.upsert(&machine).expect("插入机台失败");
    }

    pub fn add_product(&self, product_id: &str, product_name: &str) {
        self.product_repo
            .upsert(&Product::new(product_id, product_name))
            .expect("插入产品失败");
    }

    pub fn add_run(&self, run: ProductionRun) {
        self.run_repo.insert(&run).expect("插入生产批次失败");
    }

    pub fn add_downtime(&self, downtime: MachineDowntime) {
        self.downtime_repo.insert(&downtime).expect("插入停机记录失败");
    }
}
