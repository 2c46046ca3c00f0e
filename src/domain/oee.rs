// ==========================================
// OEE 分析引擎 - OEE 结果领域模型
// ==========================================
// OeeResult: 派生值对象，每次调用重新计算，不原地修改
// MachineMetrics: 持久化快照，只追加
// OeeAlert / OeeTrendPoint / OeeBreakdownEntry: 展示层输出
// ==========================================

use crate::domain::types::AlertSeverity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 百分比上限
pub const MAX_PERCENT: f64 = 100.0;

// ==========================================
// OeeResult - 单机台单窗口 OEE 结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OeeResult {
    // ===== 百分比 (0-100) =====
    pub oee: f64,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,

    // ===== 时间 (分钟) =====
    pub planned_production_time: f64,
    pub actual_run_time: f64,
    pub planned_downtime: f64,
    pub unplanned_downtime: f64,
    pub ideal_cycle_time: f64, // 分钟/件

    // ===== 产量 =====
    pub total_units_produced: i64,
    pub good_units_produced: i64,
    pub rejected_units: i64,
}

/// 百分比夹到 [0, 100]，NaN 视为 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_PERCENT)
}

/// 由三要素合成 OEE: A × P × Q / 10000，夹到 [0, 100]
pub fn compose_oee(availability: f64, performance: f64, quality: f64) -> f64 {
    clamp_percent(availability * performance * quality / 10_000.0)
}

// ==========================================
// OeeBreakdownEntry - 维度分解条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OeeBreakdownEntry {
    pub key: String,  // machine_id 或 product_id
    pub name: String, // 机台名称或产品名称
    pub result: OeeResult,
}

// ==========================================
// OeeTrendPoint - 趋势点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OeeTrendPoint {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub label: String,
    pub oee: f64,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub target: f64, // 每个点重复目标值，便于图表绘制
}

// ==========================================
// OeeAlert - OEE 告警（不持久化）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OeeAlert {
    pub machine_id: String,
    pub machine_name: String,
    pub oee: f64,
    pub threshold: f64,
    pub severity: AlertSeverity,
    pub message: String,
}

// ==========================================
// MachineMetrics - 指标快照（只追加）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineMetrics {
    pub metrics_id: String,
    pub machine_id: String,
    pub recorded_at: DateTime<Utc>,  // 写入时刻
    pub period_start: DateTime<Utc>, // 计算窗口
    pub period_end: DateTime<Utc>,
    pub result: OeeResult,
}

impl MachineMetrics {
    /// 由计算结果生成快照（自动生成 UUID）
    pub fn from_result(
        machine_id: &str,
        recorded_at: DateTime<Utc>,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        result: OeeResult,
    ) -> Self {
        Self {
            metrics_id: Uuid::new_v4().to_string(),
            machine_id: machine_id.to_string(),
            recorded_at,
            period_start,
            period_end,
            result,
        }
    }
}
