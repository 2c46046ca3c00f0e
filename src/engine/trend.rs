// ==========================================
// OEE 分析引擎 - 趋势采样
// ==========================================
// 职责: 按 小时/天/周 切分窗口，生成趋势点
// 规则: 从 start 向前步进，最后一段截断到 end；一次性返回完整列表
// ==========================================

use crate::domain::oee::{OeeResult, OeeTrendPoint};
use crate::domain::types::TrendInterval;
use chrono::{DateTime, Utc};

/// 切分采样子窗口
///
/// # 返回
/// 有序、互不重叠的 [start, end) 列表；end <= start 时为空
pub fn split_windows(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: TrendInterval,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let step = interval.step();
    let mut windows = Vec::new();
    let mut cursor = start;

    while cursor < end {
        let next = (cursor + step).min(end);
        windows.push((cursor, next));
        cursor = next;
    }

    windows
}

/// 子窗口结果 → 趋势点
pub fn to_trend_point(
    window: (DateTime<Utc>, DateTime<Utc>),
    interval: TrendInterval,
    result: &OeeResult,
    target: f64,
) -> OeeTrendPoint {
    let (period_start, period_end) = window;
    OeeTrendPoint {
        period_start,
        period_end,
        label: period_start.format(interval.label_format()).to_string(),
        oee: result.oee,
        availability: result.availability,
        performance: result.performance,
        quality: result.quality,
        target,
    }
}
