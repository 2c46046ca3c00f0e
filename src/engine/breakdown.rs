// ==========================================
// OEE 分析引擎 - 维度分解聚合
// ==========================================
// 职责: 按机台/按产品分解结果的排序与组合
// 说明: 按产品的 OEE 是近似值——质量取自该产品批次的产量，
//       可用率/性能取参与生产该产品的各机台结果的算术平均。
//       产品没有独立的运行时间，OEE 本身以机台为中心定义。
// ==========================================

use crate::domain::oee::{clamp_percent, compose_oee, OeeBreakdownEntry, OeeResult};
use crate::domain::production::ProductionRun;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// 按 OEE 降序排序（稳定排序，同分保持原顺序）
pub fn rank_descending(entries: &mut [OeeBreakdownEntry]) {
    entries.sort_by(|a, b| {
        b.result
            .oee
            .partial_cmp(&a.result.oee)
            .unwrap_or(Ordering::Equal)
    });
}

// ==========================================
// ProductGroup - 单产品批次汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductGroup {
    pub product_id: String,
    pub machine_ids: BTreeSet<String>, // 生产过该产品的机台
    pub total_units: i64,
    pub good_units: i64,
    pub rejected_units: i64,
}

/// 按产品分组生产批次（按 product_id 有序）
pub fn group_runs_by_product(runs: &[ProductionRun]) -> BTreeMap<String, ProductGroup> {
    let mut groups: BTreeMap<String, ProductGroup> = BTreeMap::new();
    for run in runs {
        let group = groups
            .entry(run.product_id.clone())
            .or_insert_with(|| ProductGroup {
                product_id: run.product_id.clone(),
                ..ProductGroup::default()
            });
        group.machine_ids.insert(run.machine_id.clone());
        group.total_units = group.total_units.saturating_add(run.quantity_produced);
        group.good_units = group.good_units.saturating_add(run.good_quantity);
        group.rejected_units = group.rejected_units.saturating_add(run.rejected_quantity);
    }
    groups
}

/// 组合单产品的近似 OEE
///
/// # 参数
/// - `group`: 产品批次汇总
/// - `machine_results`: 参与机台的窗口结果（计算失败的机台不在其中）
///
/// # 返回
/// 质量取自产品自身；可用率、性能与时间字段取机台平均；无参与机台时为 0
pub fn compose_product_result(group: &ProductGroup, machine_results: &[&OeeResult]) -> OeeResult {
    let quality = if group.total_units > 0 {
        clamp_percent(group.good_units as f64 / group.total_units as f64 * 100.0)
    } else {
        0.0
    };

    let mean = |f: fn(&OeeResult) -> f64| -> f64 {
        if machine_results.is_empty() {
            0.0
        } else {
            machine_results.iter().map(|r| f(r)).sum::<f64>() / machine_results.len() as f64
        }
    };

    let availability = clamp_percent(mean(|r| r.availability));
    let performance = clamp_percent(mean(|r| r.performance));

    OeeResult {
        oee: compose_oee(availability, performance, quality),
        availability,
        performance,
        quality,
        planned_production_time: mean(|r| r.planned_production_time),
        actual_run_time: mean(|r| r.actual_run_time),
        planned_downtime: mean(|r| r.planned_downtime),
        unplanned_downtime: mean(|r| r.unplanned_downtime),
        ideal_cycle_time: mean(|r| r.ideal_cycle_time),
        total_units_produced: group.total_units,
        good_units_produced: group.good_units,
        rejected_units: group.rejected_units,
    }
}
