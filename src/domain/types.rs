// ==========================================
// OEE 分析引擎 - 领域类型定义
// ==========================================
// 职责: 机台状态、停机类别、趋势粒度、告警等级
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 机台状态 (Machine Status)
// ==========================================
// 红线: 只有 RUNNING 机台参与 OEE 告警
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    Running,     // 运行中
    Idle,        // 空闲
    Maintenance, // 维护
    Down,        // 故障停机
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl MachineStatus {
    /// 从字符串解析机台状态（未知值按 IDLE 处理）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "RUNNING" => MachineStatus::Running,
            "MAINTENANCE" => MachineStatus::Maintenance,
            "DOWN" => MachineStatus::Down,
            _ => MachineStatus::Idle,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MachineStatus::Running => "RUNNING",
            MachineStatus::Idle => "IDLE",
            MachineStatus::Maintenance => "MAINTENANCE",
            MachineStatus::Down => "DOWN",
        }
    }
}

// ==========================================
// 停机类别 (Downtime Category)
// ==========================================
// 只区分计划/非计划：category 为 "planned" 即计划停机，其余一律视为非计划
pub const PLANNED_DOWNTIME_CATEGORY: &str = "planned";

/// 判断停机类别是否为计划停机（去空白、忽略大小写）
pub fn is_planned_category(category: &str) -> bool {
    category.trim().eq_ignore_ascii_case(PLANNED_DOWNTIME_CATEGORY)
}

// ==========================================
// 趋势采样粒度 (Trend Interval)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendInterval {
    Hour,
    Day,
    Week,
}

impl fmt::Display for TrendInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendInterval::Hour => write!(f, "HOUR"),
            TrendInterval::Day => write!(f, "DAY"),
            TrendInterval::Week => write!(f, "WEEK"),
        }
    }
}

impl TrendInterval {
    /// 单步时长
    pub fn step(&self) -> Duration {
        match self {
            TrendInterval::Hour => Duration::hours(1),
            TrendInterval::Day => Duration::days(1),
            TrendInterval::Week => Duration::weeks(1),
        }
    }

    /// 趋势点标签格式（chrono strftime）
    pub fn label_format(&self) -> &'static str {
        match self {
            TrendInterval::Hour => "%Y-%m-%d %H:00",
            TrendInterval::Day => "%Y-%m-%d",
            TrendInterval::Week => "%G-W%V",
        }
    }

    /// 从字符串解析粒度
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "HOUR" => Some(TrendInterval::Hour),
            "DAY" => Some(TrendInterval::Day),
            "WEEK" => Some(TrendInterval::Week),
            _ => None,
        }
    }
}

// ==========================================
// 告警等级 (Alert Severity)
// ==========================================
// 顺序: Warning < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Warning,  // 低于阈值
    Critical, // 低于阈值的 80%
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
