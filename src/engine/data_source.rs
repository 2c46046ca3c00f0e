// ==========================================
// OEE 分析引擎 - 数据源接口
// ==========================================
// 职责: 聚合分析引擎所需的只读集合（机台/产品/批次/停机）
//       与只追加集合（指标快照）
// 实现者: SqliteOeeDataSource（仓储层）；测试中可替换为内存实现
// ==========================================

use crate::domain::machine::{Machine, Product};
use crate::domain::oee::MachineMetrics;
use crate::domain::production::{MachineDowntime, ProductionRun};
use crate::engine::error::EngineResult;
use crate::repository::{
    DowntimeRepository, MachineMetricsRepository, MachineRepository, ProductRepository,
    ProductionRunRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

// ==========================================
// OeeDataSource Trait
// ==========================================
#[async_trait]
pub trait OeeDataSource: Send + Sync {
    // ===== 参考数据 =====

    async fn find_machine(&self, machine_id: &str) -> EngineResult<Option<Machine>>;

    async fn list_machines(&self) -> EngineResult<Vec<Machine>>;

    async fn list_products(&self) -> EngineResult<Vec<Product>>;

    // ===== 窗口查询 (start_time ∈ [start, end)) =====

    async fn list_runs_for_machine(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<ProductionRun>>;

    async fn list_runs(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<ProductionRun>>;

    async fn list_downtimes_for_machine(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<MachineDowntime>>;

    // ===== 指标快照 =====

    async fn append_metrics(&self, metrics: &MachineMetrics) -> EngineResult<()>;

    /// recorded_at ∈ [start, end]，升序
    async fn list_metrics(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<MachineMetrics>>;
}

// ==========================================
// SqliteOeeDataSource - 仓储集合
// ==========================================
/// 将 5 个 Repository 合并为 1 个数据源，简化依赖注入
#[derive(Clone)]
pub struct SqliteOeeDataSource {
    pub machine_repo: Arc<MachineRepository>,
    pub product_repo: Arc<ProductRepository>,
    pub run_repo: Arc<ProductionRunRepository>,
    pub downtime_repo: Arc<DowntimeRepository>,
    pub metrics_repo: Arc<MachineMetricsRepository>,
}

impl SqliteOeeDataSource {
    pub fn new(
        machine_repo: Arc<MachineRepository>,
        product_repo: Arc<ProductRepository>,
        run_repo: Arc<ProductionRunRepository>,
        downtime_repo: Arc<DowntimeRepository>,
        metrics_repo: Arc<MachineMetricsRepository>,
    ) -> Self {
        Self {
            machine_repo,
            product_repo,
            run_repo,
            downtime_repo,
            metrics_repo,
        }
    }
}

#[async_trait]
impl OeeDataSource for SqliteOeeDataSource {
    async fn find_machine(&self, machine_id: &str) -> EngineResult<Option<Machine>> {
        Ok(self.machine_repo.find_by_id(machine_id)?)
    }

    async fn list_machines(&self) -> EngineResult<Vec<Machine>> {
        Ok(self.machine_repo.list_all()?)
    }

    async fn list_products(&self) -> EngineResult<Vec<Product>> {
        Ok(self.product_repo.list_all()?)
    }

    async fn list_runs_for_machine(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<ProductionRun>> {
        Ok(self.run_repo.list_by_machine_in_range(machine_id, start, end)?)
    }

    async fn list_runs(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<ProductionRun>> {
        Ok(self.run_repo.list_in_range(start, end)?)
    }

    async fn list_downtimes_for_machine(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<MachineDowntime>> {
        Ok(self
            .downtime_repo
            .list_by_machine_in_range(machine_id, start, end)?)
    }

    async fn append_metrics(&self, metrics: &MachineMetrics) -> EngineResult<()> {
        Ok(self.metrics_repo.append(metrics)?)
    }

    async fn list_metrics(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<MachineMetrics>> {
        Ok(self
            .metrics_repo
            .list_by_machine_in_range(machine_id, start, end)?)
    }
}
