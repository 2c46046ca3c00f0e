// ==========================================
// OEE 分析引擎 - 指标计算器
// ==========================================
// 职责: 单机台 × 单时间窗口 → OeeResult
// 输入: 机台参考数据 + 窗口内生产批次 + 窗口内停机记录
// 红线: 纯计算，不访问数据源；分母 <= 0 时结果为 0，不产生 NaN/Infinity
// ==========================================

use crate::domain::machine::Machine;
use crate::domain::oee::{clamp_percent, compose_oee, OeeResult};
use crate::domain::production::{MachineDowntime, ProductionRun};
use chrono::{DateTime, Utc};

// ==========================================
// OeeCalculator - 指标计算器
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct OeeCalculator {
    // 无状态引擎
}

impl OeeCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算单机台单窗口 OEE
    ///
    /// # 参数
    /// - `machine`: 机台（提供目标速度）
    /// - `start`/`end`: 窗口 [start, end)
    /// - `runs`: 窗口内开始的生产批次
    /// - `downtimes`: 窗口内开始的停机记录
    /// - `now`: 未结束停机的截止时刻
    ///
    /// # 返回
    /// 四项百分比均夹到 [0, 100]；反向或零宽窗口得到全 0 百分比
    pub fn compute(
        &self,
        machine: &Machine,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        runs: &[ProductionRun],
        downtimes: &[MachineDowntime],
        now: DateTime<Utc>,
    ) -> OeeResult {
        // 1. 时间
        let total_time = minutes_between(start, end).max(0.0);
        let (planned_downtime, unplanned_downtime) = self.sum_downtime(downtimes, now);
        let planned_production_time = total_time - planned_downtime;
        let actual_run_time = planned_production_time - unplanned_downtime;

        // 2. 可用率
        let availability = if planned_production_time > 0.0 {
            clamp_percent(actual_run_time / planned_production_time * 100.0)
        } else {
            0.0
        };

        // 3. 产量
        let (total_units_produced, good_units_produced, rejected_units) = runs.iter().fold(
            (0_i64, 0_i64, 0_i64),
            |(total, good, rejected), run| {
                (
                    total.saturating_add(run.quantity_produced),
                    good.saturating_add(run.good_quantity),
                    rejected.saturating_add(run.rejected_quantity),
                )
            },
        );

        // 4. 性能
        let ideal_cycle_time = machine.ideal_cycle_time_minutes();
        let performance = if actual_run_time > 0.0 {
            clamp_percent(ideal_cycle_time * total_units_produced as f64 / actual_run_time * 100.0)
        } else {
            0.0
        };

        // 5. 质量
        let quality = if total_units_produced > 0 {
            clamp_percent(good_units_produced as f64 / total_units_produced as f64 * 100.0)
        } else {
            0.0
        };

        OeeResult {
            oee: compose_oee(availability, performance, quality),
            availability,
            performance,
            quality,
            planned_production_time,
            actual_run_time,
            planned_downtime,
            unplanned_downtime,
            ideal_cycle_time,
            total_units_produced,
            good_units_produced,
            rejected_units,
        }
    }

    /// 停机时长汇总
    ///
    /// # 返回
    /// (计划停机分钟, 非计划停机分钟)
    fn sum_downtime(&self, downtimes: &[MachineDowntime], now: DateTime<Utc>) -> (f64, f64) {
        downtimes
            .iter()
            .fold((0.0, 0.0), |(planned, unplanned), dt| {
                let minutes = dt.duration_minutes(now);
                if dt.is_planned() {
                    (planned + minutes, unplanned)
                } else {
                    (planned, unplanned + minutes)
                }
            })
    }
}

/// 两时刻间的分钟数（可为负）
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}
