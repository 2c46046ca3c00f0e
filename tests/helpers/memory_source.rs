// ==========================================
// 内存数据源 - 用于引擎层集成测试
// ==========================================
// 可指定部分机台读取失败，验证单机台失败不影响整体
// ==========================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oee_analytics::domain::{Machine, MachineDowntime, MachineMetrics, Product, ProductionRun};
use oee_analytics::engine::{EngineResult, OeeDataSource, OeeError};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryDataSource {
    pub machines: Vec<Machine>,
    pub products: Vec<Product>,
    pub runs: Vec<ProductionRun>,
    pub downtimes: Vec<MachineDowntime>,
    pub metrics: Mutex<Vec<MachineMetrics>>,
    /// 读取批次时返回错误的机台
    pub failing_machines: HashSet<String>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_machine(mut self, machine: Machine) -> Self {
        self.machines.push(machine);
        self
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    pub fn with_run(mut self, run: ProductionRun) -> Self {
        self.runs.push(run);
        self
    }

    pub fn with_downtime(mut self, downtime: MachineDowntime) -> Self {
        self.downtimes.push(downtime);
        self
    }

    pub fn failing(mut self, machine_id: &str) -> Self {
        self.failing_machines.insert(machine_id.to_string());
        self
    }

    pub fn stored_metrics(&self) -> Vec<MachineMetrics> {
        self.metrics.lock().unwrap().clone()
    }
}

fn in_window(ts: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    ts >= start && ts < end
}

#[async_trait]
impl OeeDataSource for InMemoryDataSource {
    async fn find_machine(&self, machine_id: &str) -> EngineResult<Option<Machine>> {
        Ok(self
            .machines
            .iter()
            .find(|m| m.machine_id == machine_id)
            .cloned())
    }

    async fn list_machines(&self) -> EngineResult<Vec<Machine>> {
        Ok(self.machines.clone())
    }

    async fn list_products(&self) -> EngineResult<Vec<Product>> {
        Ok(self.products.clone())
    }

    async fn list_runs_for_machine(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<ProductionRun>> {
        if self.failing_machines.contains(machine_id) {
            return Err(OeeError::DataSource(format!(
                "simulated read failure for {}",
                machine_id
            )));
        }
        Ok(self
            .runs
            .iter()
            .filter(|r| r.machine_id == machine_id && in_window(r.start_time, start, end))
            .cloned()
            .collect())
    }

    async fn list_runs(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<ProductionRun>> {
        Ok(self
            .runs
            .iter()
            .filter(|r| in_window(r.start_time, start, end))
            .cloned()
            .collect())
    }

    async fn list_downtimes_for_machine(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<MachineDowntime>> {
        Ok(self
            .downtimes
            .iter()
            .filter(|d| d.machine_id == machine_id && in_window(d.start_time, start, end))
            .cloned()
            .collect())
    }

    async fn append_metrics(&self, metrics: &MachineMetrics) -> EngineResult<()> {
        self.metrics
            .lock()
            .map_err(|e| OeeError::DataSource(e.to_string()))?
            .push(metrics.clone());
        Ok(())
    }

    async fn list_metrics(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<MachineMetrics>> {
        let guard = self
            .metrics
            .lock()
            .map_err(|e| OeeError::DataSource(e.to_string()))?;
        let mut rows: Vec<MachineMetrics> = guard
            .iter()
            .filter(|m| m.machine_id == machine_id && m.recorded_at >= start && m.recorded_at <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.recorded_at);
        Ok(rows)
    }
}
