// ==========================================
// OeeApi 集成测试
// ==========================================
// 测试范围:
// 1. 单机台计算: calculate（标准班次场景、停机、退化输入、错误）
// 2. 维度分解: breakdown_by_machine, breakdown_by_product
// 3. 趋势: trend
// 4. 告警: alerts
// 5. 快照: store_snapshot, historical_metrics
// 6. 限流
// ==========================================

mod helpers;

use chrono::{Duration, TimeZone, Utc};
use helpers::api_test_helper::*;
use helpers::test_data_builder::{downtime, open_downtime, MachineBuilder, RunBuilder};
use oee_analytics::api::ApiError;
use oee_analytics::config::config_keys;
use oee_analytics::domain::types::{AlertSeverity, MachineStatus, TrendInterval};

/// 标准产线:
/// - M1: 480 分钟无停机，产 480 件全良（OEE 100）
/// - M2: 非计划停机 60 分钟，产 400 件良品 380（OEE ≈ 79.17）
/// - M3: IDLE，无产出
/// - M4: RUNNING，无产出（OEE 0）
fn seed_line(env: &ApiTestEnv) {
    let start = shift_start();

    env.add_machine(MachineBuilder::new("M1").name("一号线").build());
    env.add_machine(MachineBuilder::new("M2").name("二号线").build());
    env.add_machine(
        MachineBuilder::new("M3")
            .name("三号线")
            .status(MachineStatus::Idle)
            .build(),
    );
    env.add_machine(MachineBuilder::new("M4").name("四号线").build());

    env.add_run(RunBuilder::new("M1", "P1", start).units(480, 480).lasting(480).build());
    env.add_downtime(downtime("M2", start + Duration::minutes(60), 60, "breakdown"));
    env.add_run(RunBuilder::new("M2", "P1", start).units(200, 190).lasting(240).build());
    env.add_run(
        RunBuilder::new("M2", "P2", start + Duration::minutes(240))
            .units(200, 190)
            .lasting(240)
            .build(),
    );
}

// ==========================================
// calculate
// ==========================================

#[tokio::test]
async fn test_calculate_完美班次() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let r = env
        .oee_api
        .calculate("M1", shift_start(), shift_end())
        .await
        .unwrap();

    assert_close(r.ideal_cycle_time, 1.0, 1e-9);
    assert_close(r.planned_production_time, 480.0, 1e-9);
    assert_close(r.actual_run_time, 480.0, 1e-9);
    assert_close(r.availability, 100.0, 1e-9);
    assert_close(r.performance, 100.0, 1e-9);
    assert_close(r.quality, 100.0, 1e-9);
    assert_close(r.oee, 100.0, 1e-9);
    assert_eq!(r.total_units_produced, 480);
    assert_eq!(r.rejected_units, 0);
}

#[tokio::test]
async fn test_calculate_非计划停机() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let r = env
        .oee_api
        .calculate("M2", shift_start(), shift_end())
        .await
        .unwrap();

    assert_close(r.unplanned_downtime, 60.0, 1e-9);
    assert_close(r.planned_downtime, 0.0, 1e-9);
    assert_close(r.actual_run_time, 420.0, 1e-9);
    assert_close(r.availability, 87.5, 1e-9);
    assert_close(r.performance, 400.0 / 420.0 * 100.0, 1e-9);
    assert_close(r.quality, 95.0, 1e-9);
    assert_close(r.oee, 79.17, 0.01);
    assert_close(
        r.oee,
        r.availability * r.performance * r.quality / 10000.0,
        1e-9,
    );
    assert_eq!(r.good_units_produced, 380);
    assert_eq!(r.rejected_units, 20);
}

#[tokio::test]
async fn test_calculate_计划停机不计入可用率损失() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let start = shift_start();
    env.add_machine(MachineBuilder::new("M1").build());
    env.add_downtime(downtime("M1", start, 60, " Planned "));
    env.add_run(RunBuilder::new("M1", "P1", start + Duration::minutes(60)).units(420, 420).build());

    let r = env.oee_api.calculate("M1", start, shift_end()).await.unwrap();

    assert_close(r.planned_downtime, 60.0, 1e-9);
    assert_close(r.planned_production_time, 420.0, 1e-9);
    assert_close(r.availability, 100.0, 1e-9);
    assert_close(r.performance, 100.0, 1e-9);
    assert_close(r.oee, 100.0, 1e-9);
}

#[tokio::test]
async fn test_calculate_未结束停机截止到当前时刻() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.add_machine(MachineBuilder::new("M1").build());
    // 时钟固定在 shift_end，停机从结束前 60 分钟开始且尚未结束
    env.add_downtime(open_downtime("M1", shift_end() - Duration::minutes(60), "jam"));

    let r = env
        .oee_api
        .calculate("M1", shift_start(), shift_end())
        .await
        .unwrap();

    assert_close(r.unplanned_downtime, 60.0, 1e-9);
    assert_close(r.availability, 87.5, 1e-9);
}

#[tokio::test]
async fn test_calculate_无产量() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.add_machine(MachineBuilder::new("M1").build());

    let r = env
        .oee_api
        .calculate("M1", shift_start(), shift_end())
        .await
        .unwrap();

    assert_eq!(r.total_units_produced, 0);
    assert_eq!(r.quality, 0.0);
    assert_eq!(r.rejected_units, r.total_units_produced - r.good_units_produced);
    assert_eq!(r.oee, 0.0);
}

#[tokio::test]
async fn test_calculate_窗口结束时刻带亚毫秒() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.add_machine(MachineBuilder::new("M1").build());

    let base = Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap();
    let start = base - Duration::hours(1);
    let end = base + Duration::microseconds(800);
    env.add_run(
        RunBuilder::new("M1", "P1", base + Duration::microseconds(200))
            .units(30, 30)
            .build(),
    );

    let r = env.oee_api.calculate("M1", start, end).await.unwrap();
    assert_eq!(r.total_units_produced, 30);
    assert_eq!(r.good_units_produced, 30);
}

#[tokio::test]
async fn test_calculate_反向窗口结果为零() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let r = env
        .oee_api
        .calculate("M1", shift_end(), shift_start())
        .await
        .unwrap();

    for v in [r.oee, r.availability, r.performance, r.quality] {
        assert!(v.is_finite());
        assert_eq!(v, 0.0);
    }
}

#[tokio::test]
async fn test_calculate_机台不存在() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .oee_api
        .calculate("NOPE", shift_start(), shift_end())
        .await
        .unwrap_err();

    match err {
        ApiError::NotFound(msg) => assert!(msg.contains("NOPE")),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_calculate_空机台ID() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .oee_api
        .calculate("   ", shift_start(), shift_end())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

// ==========================================
// 维度分解
// ==========================================

#[tokio::test]
async fn test_breakdown_by_machine_降序() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let rows = env
        .oee_api
        .breakdown_by_machine(shift_start(), shift_end())
        .await
        .unwrap();

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].key, "M1");
    assert_eq!(rows[0].name, "一号线");
    assert_eq!(rows[1].key, "M2");
    for pair in rows.windows(2) {
        assert!(pair[0].result.oee >= pair[1].result.oee);
    }
}

#[tokio::test]
async fn test_breakdown_by_product_近似平均() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);
    env.add_product("P1", "齿轮");

    let rows = env
        .oee_api
        .breakdown_by_product(shift_start(), shift_end())
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);

    // P1: M1 + M2 参与，可用率/性能取两台平均，质量取 P1 自身产量
    let p1 = &rows[0];
    assert_eq!(p1.key, "P1");
    assert_eq!(p1.name, "齿轮");
    assert_close(p1.result.availability, (100.0 + 87.5) / 2.0, 1e-9);
    assert_close(
        p1.result.performance,
        (100.0 + 400.0 / 420.0 * 100.0) / 2.0,
        1e-9,
    );
    assert_eq!(p1.result.total_units_produced, 680);
    assert_eq!(p1.result.good_units_produced, 670);
    assert_close(p1.result.quality, 670.0 / 680.0 * 100.0, 1e-9);

    // P2: 仅 M2；无产品名称时以 ID 作为名称
    let p2 = &rows[1];
    assert_eq!(p2.key, "P2");
    assert_eq!(p2.name, "P2");
    assert_close(p2.result.availability, 87.5, 1e-9);
    assert_close(p2.result.quality, 95.0, 1e-9);
    assert!(p1.result.oee >= p2.result.oee);
}

#[tokio::test]
async fn test_breakdown_by_product_空窗口() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let later = shift_end() + Duration::days(1);
    let rows = env
        .oee_api
        .breakdown_by_product(later, later + Duration::hours(8))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

// ==========================================
// 趋势
// ==========================================

#[tokio::test]
async fn test_trend_两天按天() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let end = start + Duration::days(2);

    let points = env
        .oee_api
        .trend("M1", start, end, TrendInterval::Day, None)
        .await
        .unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].period_start, start);
    assert_eq!(points[0].period_end, points[1].period_start);
    assert_eq!(points[1].period_end, end);
    assert_eq!(points[0].label, "2026-03-01");
    assert_eq!(points[1].label, "2026-03-02");
    // 目标值取配置默认
    assert_close(points[0].target, 85.0, 1e-9);
    // 第一天无产出，第二天包含班次批次
    assert_eq!(points[0].quality, 0.0);
    assert_close(points[1].quality, 100.0, 1e-9);
}

#[tokio::test]
async fn test_trend_最后一段截断() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let end = start + Duration::hours(36);

    let points = env
        .oee_api
        .trend("M1", start, end, TrendInterval::Day, Some(60.0))
        .await
        .unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[1].period_end, end);
    assert_eq!(points[1].period_end - points[1].period_start, Duration::hours(12));
    assert!(points.iter().all(|p| p.target == 60.0));
}

#[tokio::test]
async fn test_trend_目标值越界() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let err = env
        .oee_api
        .trend("M1", shift_start(), shift_end(), TrendInterval::Hour, Some(120.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_trend_机台不存在() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .oee_api
        .trend("NOPE", shift_start(), shift_end(), TrendInterval::Hour, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// ==========================================
// 告警
// ==========================================

#[tokio::test]
async fn test_alerts_最差在前_严重度() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let alerts = env
        .oee_api
        .alerts(Some(85.0), shift_start(), shift_end())
        .await
        .unwrap();

    // M1 达标；M3 非 RUNNING 不参与
    let ids: Vec<&str> = alerts.iter().map(|a| a.machine_id.as_str()).collect();
    assert_eq!(ids, vec!["M4", "M2"]);

    assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    assert_eq!(alerts[0].oee, 0.0);
    assert_eq!(alerts[1].severity, AlertSeverity::Warning);
    assert_close(alerts[1].threshold, 85.0, 1e-9);
    assert!(alerts[1].message.contains("二号线"));
}

#[tokio::test]
async fn test_alerts_默认阈值来自配置() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);
    env.config_manager
        .set_global_config_value(config_keys::OEE_ALERT_THRESHOLD_PCT, "50")
        .unwrap();

    let alerts = env
        .oee_api
        .alerts(None, shift_start(), shift_end())
        .await
        .unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].machine_id, "M4");
    assert_close(alerts[0].threshold, 50.0, 1e-9);
}

#[tokio::test]
async fn test_alerts_阈值越界() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .oee_api
        .alerts(Some(-1.0), shift_start(), shift_end())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

// ==========================================
// 快照
// ==========================================

#[tokio::test]
async fn test_store_snapshot_后查询历史() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    let computed = env
        .oee_api
        .calculate("M2", shift_start(), shift_end())
        .await
        .unwrap();
    let stored = env
        .oee_api
        .store_snapshot("M2", shift_start(), shift_end())
        .await
        .unwrap();
    assert_eq!(stored.recorded_at, fixed_now());

    let history = env
        .oee_api
        .historical_metrics("M2", shift_start(), shift_end())
        .await
        .unwrap();

    assert_eq!(history.len(), 1);
    let snap = &history[0];
    assert_eq!(snap.metrics_id, stored.metrics_id);
    assert_eq!(snap.period_start, shift_start());
    assert_eq!(snap.period_end, shift_end());
    assert_close(snap.result.oee, computed.oee, 1e-9);
    assert_close(snap.result.availability, computed.availability, 1e-9);
    assert_close(snap.result.performance, computed.performance, 1e-9);
    assert_close(snap.result.quality, computed.quality, 1e-9);
}

#[tokio::test]
async fn test_store_snapshot_系统时钟读回一致() {
    let env = ApiTestEnv::with_system_clock().expect("无法创建测试环境");
    seed_line(&env);

    let before = Utc::now();
    let stored = env
        .oee_api
        .store_snapshot("M1", shift_start(), shift_end())
        .await
        .unwrap();

    let history = env
        .oee_api
        .historical_metrics("M1", before, Utc::now() + Duration::seconds(1))
        .await
        .unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0], stored);
    assert_eq!(history[0].recorded_at, stored.recorded_at);
    assert_eq!(history[0].period_start, stored.period_start);
    assert_eq!(history[0].period_end, stored.period_end);
}

#[tokio::test]
async fn test_store_snapshot_不去重() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    seed_line(&env);

    for _ in 0..2 {
        env.oee_api
            .store_snapshot("M1", shift_start(), shift_end())
            .await
            .unwrap();
    }

    let history = env
        .oee_api
        .historical_metrics("M1", shift_start(), shift_end())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_ne!(history[0].metrics_id, history[1].metrics_id);
}

#[tokio::test]
async fn test_store_snapshot_机台不存在() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .oee_api
        .store_snapshot("NOPE", shift_start(), shift_end())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let rows = env
        .metrics_repo
        .list_by_machine_in_range("NOPE", shift_start(), shift_end())
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_historical_metrics_未知机台为空() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let rows = env
        .oee_api
        .historical_metrics("NOPE", shift_start(), shift_end())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

// ==========================================
// 限流
// ==========================================

#[tokio::test]
async fn test_rate_limit_超出窗口配额() {
    let env = ApiTestEnv::with_rate_limit(2).expect("无法创建测试环境");
    seed_line(&env);

    for _ in 0..2 {
        env.oee_api
            .calculate("M1", shift_start(), shift_end())
            .await
            .unwrap();
    }

    let err = env
        .oee_api
        .calculate("M1", shift_start(), shift_end())
        .await
        .unwrap_err();
    match err {
        ApiError::RateLimited { key, limit, .. } => {
            assert_eq!(key, "calculate");
            assert_eq!(limit, 2);
        }
        other => panic!("Expected RateLimited, got {:?}", other),
    }

    // 其它操作独立计数
    assert!(env
        .oee_api
        .breakdown_by_machine(shift_start(), shift_end())
        .await
        .is_ok());
}
