// ==========================================
// OEE 分析引擎 - 分析服务
// ==========================================
// 数据流: 数据源 → 指标计算器 → {维度分解, 趋势采样, 告警判定} → 展示层/快照存储
// 约束:
// - 每次计算无状态、只读、幂等
// - 多机台扇出采用有界并发（上限取配置 oee_max_concurrency）
// - 单机台失败只记日志并跳过，不中断整体
// ==========================================

use crate::config::defaults;
use crate::config::OeeConfigReader;
use crate::domain::machine::Machine;
use crate::domain::oee::{MachineMetrics, OeeAlert, OeeBreakdownEntry, OeeResult, OeeTrendPoint};
use crate::domain::types::TrendInterval;
use crate::engine::alert::{evaluate_machine, sort_worst_first};
use crate::engine::breakdown::{compose_product_result, group_runs_by_product, rank_descending};
use crate::engine::data_source::OeeDataSource;
use crate::engine::error::{EngineResult, OeeError};
use crate::engine::oee_calculator::OeeCalculator;
use crate::engine::trend::{split_windows, to_trend_point};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 时钟函数（未结束停机的截止时刻）
pub type Clock = fn() -> DateTime<Utc>;

// ==========================================
// OeeAnalyticsEngine - 分析服务
// ==========================================
// 应用启动时构造一次，按引用注入调用方
pub struct OeeAnalyticsEngine {
    data_source: Arc<dyn OeeDataSource>,
    config: Arc<dyn OeeConfigReader>,
    calculator: OeeCalculator,
    clock: Clock,
}

impl OeeAnalyticsEngine {
    pub fn new(data_source: Arc<dyn OeeDataSource>, config: Arc<dyn OeeConfigReader>) -> Self {
        Self {
            data_source,
            config,
            calculator: OeeCalculator::new(),
            clock: Utc::now,
        }
    }

    /// 替换时钟（测试中固定 "now"）
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    // ==========================================
    // 指标计算
    // ==========================================

    /// 计算单机台单窗口 OEE
    ///
    /// # 错误
    /// - `MachineNotFound`: 机台不存在
    pub async fn calculate(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<OeeResult> {
        let machine = self.require_machine(machine_id).await?;
        self.calculate_for_machine(&machine, start, end).await
    }

    async fn require_machine(&self, machine_id: &str) -> EngineResult<Machine> {
        self.data_source
            .find_machine(machine_id)
            .await?
            .ok_or_else(|| OeeError::MachineNotFound {
                machine_id: machine_id.to_string(),
            })
    }

    async fn calculate_for_machine(
        &self,
        machine: &Machine,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<OeeResult> {
        let runs = self
            .data_source
            .list_runs_for_machine(&machine.machine_id, start, end)
            .await?;
        let downtimes = self
            .data_source
            .list_downtimes_for_machine(&machine.machine_id, start, end)
            .await?;

        let result = self
            .calculator
            .compute(machine, start, end, &runs, &downtimes, (self.clock)());

        debug!(
            machine_id = %machine.machine_id,
            runs = runs.len(),
            downtimes = downtimes.len(),
            oee = result.oee,
            "OEE 计算完成"
        );
        Ok(result)
    }

    /// 有界并发地为多台机台计算同一窗口（结果顺序与输入一致）
    async fn calculate_many<'a>(
        &'a self,
        machines: &'a [Machine],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<(&'a Machine, EngineResult<OeeResult>)> {
        let limit = self.max_concurrency().await;
        stream::iter(machines)
            .map(|machine| async move { (machine, self.calculate_for_machine(machine, start, end).await) })
            .buffered(limit)
            .collect()
            .await
    }

    async fn max_concurrency(&self) -> usize {
        match self.config.get_max_concurrency().await {
            Ok(v) => v.max(1),
            Err(e) => {
                warn!(error = %e, "读取并发上限失败，使用默认值");
                defaults::MAX_CONCURRENCY
            }
        }
    }

    // ==========================================
    // 维度分解
    // ==========================================

    /// 按机台分解（OEE 降序）
    pub async fn breakdown_by_machine(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<OeeBreakdownEntry>> {
        let machines = self.data_source.list_machines().await?;
        let outcomes = self.calculate_many(&machines, start, end).await;

        let mut entries = Vec::with_capacity(outcomes.len());
        for (machine, outcome) in outcomes {
            match outcome {
                Ok(result) => entries.push(OeeBreakdownEntry {
                    key: machine.machine_id.clone(),
                    name: machine.machine_name.clone(),
                    result,
                }),
                Err(e) => warn!(
                    machine_id = %machine.machine_id,
                    error = %e,
                    "机台 OEE 计算失败，已从分解结果中跳过"
                ),
            }
        }

        rank_descending(&mut entries);
        info!(machines = machines.len(), entries = entries.len(), "按机台分解完成");
        Ok(entries)
    }

    /// 按产品分解（OEE 降序，近似值，见 breakdown 模块说明）
    pub async fn breakdown_by_product(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<OeeBreakdownEntry>> {
        let runs = self.data_source.list_runs(start, end).await?;
        let groups = group_runs_by_product(&runs);
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let product_names: HashMap<String, String> = self
            .data_source
            .list_products()
            .await?
            .into_iter()
            .map(|p| (p.product_id, p.product_name))
            .collect();

        // 只计算参与过的机台；批次引用了不存在的机台时记日志并跳过
        let touched: Vec<&String> = {
            let mut ids: Vec<&String> = groups.values().flat_map(|g| g.machine_ids.iter()).collect();
            ids.sort();
            ids.dedup();
            ids
        };
        let known: HashMap<String, Machine> = self
            .data_source
            .list_machines()
            .await?
            .into_iter()
            .map(|m| (m.machine_id.clone(), m))
            .collect();
        let mut machines = Vec::with_capacity(touched.len());
        for id in touched {
            match known.get(id) {
                Some(m) => machines.push(m.clone()),
                None => warn!(machine_id = %id, "生产批次引用的机台不存在，已跳过"),
            }
        }

        let mut machine_results: HashMap<String, OeeResult> = HashMap::new();
        for (machine, outcome) in self.calculate_many(&machines, start, end).await {
            match outcome {
                Ok(result) => {
                    machine_results.insert(machine.machine_id.clone(), result);
                }
                Err(e) => warn!(
                    machine_id = %machine.machine_id,
                    error = %e,
                    "机台 OEE 计算失败，不计入产品平均"
                ),
            }
        }

        let mut entries: Vec<OeeBreakdownEntry> = groups
            .values()
            .map(|group| {
                let contributing: Vec<&OeeResult> = group
                    .machine_ids
                    .iter()
                    .filter_map(|id| machine_results.get(id))
                    .collect();
                OeeBreakdownEntry {
                    key: group.product_id.clone(),
                    name: product_names
                        .get(&group.product_id)
                        .cloned()
                        .unwrap_or_else(|| group.product_id.clone()),
                    result: compose_product_result(group, &contributing),
                }
            })
            .collect();

        rank_descending(&mut entries);
        info!(products = entries.len(), "按产品分解完成");
        Ok(entries)
    }

    // ==========================================
    // 趋势采样
    // ==========================================

    /// 按粒度生成趋势序列
    pub async fn trend(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: TrendInterval,
        target: f64,
    ) -> EngineResult<Vec<OeeTrendPoint>> {
        let machine = self.require_machine(machine_id).await?;

        let mut points = Vec::new();
        for window in split_windows(start, end, interval) {
            let result = self.calculate_for_machine(&machine, window.0, window.1).await?;
            points.push(to_trend_point(window, interval, &result, target));
        }

        debug!(machine_id, %interval, points = points.len(), "趋势采样完成");
        Ok(points)
    }

    // ==========================================
    // 告警
    // ==========================================

    /// 评估 RUNNING 机台，返回低于阈值的告警（最差在前）
    pub async fn alerts(
        &self,
        threshold: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<OeeAlert>> {
        let running: Vec<Machine> = self
            .data_source
            .list_machines()
            .await?
            .into_iter()
            .filter(|m| m.is_running())
            .collect();

        let mut alerts = Vec::new();
        for (machine, outcome) in self.calculate_many(&running, start, end).await {
            match outcome {
                Ok(result) => {
                    if let Some(alert) = evaluate_machine(machine, result.oee, threshold) {
                        alerts.push(alert);
                    }
                }
                Err(e) => warn!(
                    machine_id = %machine.machine_id,
                    error = %e,
                    "机台 OEE 计算失败，跳过告警评估"
                ),
            }
        }

        sort_worst_first(&mut alerts);
        info!(
            evaluated = running.len(),
            alerts = alerts.len(),
            threshold,
            "OEE 告警评估完成"
        );
        Ok(alerts)
    }

    // ==========================================
    // 指标快照
    // ==========================================

    /// 计算并追加一条快照（不去重）
    pub async fn store_snapshot(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<MachineMetrics> {
        let result = self.calculate(machine_id, start, end).await?;
        let metrics =
            MachineMetrics::from_result(machine_id, (self.clock)(), start, end, result);
        self.data_source.append_metrics(&metrics).await?;

        info!(
            machine_id,
            metrics_id = %metrics.metrics_id,
            oee = metrics.result.oee,
            "OEE 快照已写入"
        );
        Ok(metrics)
    }

    /// 历史快照（按 recorded_at 范围过滤，升序）
    pub async fn historical_metrics(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<MachineMetrics>> {
        self.data_source.list_metrics(machine_id, start, end).await
    }
}
