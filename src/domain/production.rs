// ==========================================
// OEE 分析引擎 - 生产/停机记录领域模型
// ==========================================
// ProductionRun: 生产批次开始时创建，OEE 计算只读
// MachineDowntime: 停机区间，end_time 为空表示仍在停机
// ==========================================

use crate::domain::types::is_planned_category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ProductionRun - 生产批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRun {
    pub run_id: String,
    pub machine_id: String,
    pub product_id: String,

    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,

    // ===== 产量 =====
    pub quantity_produced: i64, // 实际产量
    pub good_quantity: i64,     // 良品数
    pub rejected_quantity: i64, // 不良数
}

impl ProductionRun {
    /// 创建新的生产批次（自动生成 UUID）
    pub fn new(
        machine_id: impl Into<String>,
        product_id: impl Into<String>,
        start_time: DateTime<Utc>,
        quantity_produced: i64,
        good_quantity: i64,
        rejected_quantity: i64,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            machine_id: machine_id.into(),
            product_id: product_id.into(),
            start_time,
            end_time: None,
            quantity_produced,
            good_quantity,
            rejected_quantity,
        }
    }
}

// ==========================================
// MachineDowntime - 停机记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineDowntime {
    pub downtime_id: String,
    pub machine_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>, // None = 仍在停机
    pub category: String,                // "planned" 或其它(非计划)
    pub reason: Option<String>,
}

impl MachineDowntime {
    pub fn new(
        machine_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            downtime_id: Uuid::new_v4().to_string(),
            machine_id: machine_id.into(),
            start_time,
            end_time,
            category: category.into(),
            reason: None,
        }
    }

    pub fn is_planned(&self) -> bool {
        is_planned_category(&self.category)
    }

    /// 停机时长（分钟）
    ///
    /// 未结束的停机按 `now` 计算；结果不小于 0
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> f64 {
        let end = self.end_time.unwrap_or(now);
        let secs = (end - self.start_time).num_milliseconds() as f64 / 1000.0;
        (secs / 60.0).max(0.0)
    }
}
