// ==========================================
// OEE 分析引擎 - 告警判定
// ==========================================
// 规则:
// - OEE < 阈值 才告警（严格小于）
// - OEE < 阈值 × 0.8 为 CRITICAL，否则 WARNING
// - 结果按 OEE 升序（最差在前）
// - 非 RUNNING 机台不参与 OEE 告警（可用性告警另行处理）
// ==========================================

use crate::domain::machine::Machine;
use crate::domain::oee::OeeAlert;
use crate::domain::types::AlertSeverity;
use crate::i18n::t_with_args;
use std::cmp::Ordering;

/// CRITICAL 判定系数
pub const CRITICAL_RATIO: f64 = 0.8;

/// 告警等级判定
///
/// # 返回
/// - None: 不低于阈值，不告警
/// - Some(severity): 告警等级
pub fn severity_for(oee: f64, threshold: f64) -> Option<AlertSeverity> {
    if oee >= threshold {
        return None;
    }
    if oee < threshold * CRITICAL_RATIO {
        Some(AlertSeverity::Critical)
    } else {
        Some(AlertSeverity::Warning)
    }
}

/// 生成单机台告警（不低于阈值时返回 None）
pub fn evaluate_machine(machine: &Machine, oee: f64, threshold: f64) -> Option<OeeAlert> {
    let severity = severity_for(oee, threshold)?;
    Some(OeeAlert {
        machine_id: machine.machine_id.clone(),
        machine_name: machine.machine_name.clone(),
        oee,
        threshold,
        severity,
        message: alert_message(&machine.machine_name, oee, threshold, severity),
    })
}

/// 告警文案（按当前语言）
pub fn alert_message(machine_name: &str, oee: f64, threshold: f64, severity: AlertSeverity) -> String {
    let key = match severity {
        AlertSeverity::Critical => "oee.alert.critical",
        AlertSeverity::Warning => "oee.alert.warning",
    };
    let oee = format!("{:.1}", oee);
    let threshold = format!("{:.1}", threshold);
    t_with_args(
        key,
        &[
            ("machine", machine_name),
            ("oee", oee.as_str()),
            ("threshold", threshold.as_str()),
        ],
    )
}

/// 按 OEE 升序排序（最差在前）
pub fn sort_worst_first(alerts: &mut [OeeAlert]) {
    alerts.sort_by(|a, b| a.oee.partial_cmp(&b.oee).unwrap_or(Ordering::Equal));
}
