// ==========================================
// OEE 分析引擎 - OEE API
// ==========================================
// 职责: 面向展示层的 7 个操作；入参校验、限流、错误转换
// 架构: API 层 → OeeAnalyticsEngine → OeeDataSource
// 说明: 时间窗口形状不校验（反向/零宽窗口返回退化结果）
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::error::{ApiError, ApiResult};
use crate::api::rate_limiter::RateLimiter;
use crate::config::{defaults, OeeConfigReader};
use crate::domain::oee::{MachineMetrics, OeeAlert, OeeBreakdownEntry, OeeResult, OeeTrendPoint};
use crate::domain::types::TrendInterval;
use crate::engine::OeeAnalyticsEngine;
use crate::perf::PerfGuard;

// ==========================================
// OeeApi
// ==========================================
pub struct OeeApi {
    engine: Arc<OeeAnalyticsEngine>,
    config: Arc<dyn OeeConfigReader>,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl OeeApi {
    /// 创建新的 OeeApi 实例
    ///
    /// # 参数
    /// - engine: 分析服务
    /// - config: 配置读取（默认阈值/目标值）
    /// - rate_limiter: 限流器（None 表示不限流）
    pub fn new(
        engine: Arc<OeeAnalyticsEngine>,
        config: Arc<dyn OeeConfigReader>,
        rate_limiter: Option<Arc<RateLimiter>>,
    ) -> Self {
        Self {
            engine,
            config,
            rate_limiter,
        }
    }

    fn guard(&self, op: &str) -> ApiResult<()> {
        match &self.rate_limiter {
            Some(limiter) => limiter.check(op),
            None => Ok(()),
        }
    }

    // ==========================================
    // 指标计算
    // ==========================================

    /// 计算单机台单窗口 OEE
    pub async fn calculate(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<OeeResult> {
        self.guard("calculate")?;
        let _perf = PerfGuard::new("api.calculate");
        validate_machine_id(machine_id)?;

        Ok(self.engine.calculate(machine_id, start, end).await?)
    }

    // ==========================================
    // 维度分解
    // ==========================================

    /// 按机台分解（OEE 降序）
    pub async fn breakdown_by_machine(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<Vec<OeeBreakdownEntry>> {
        self.guard("breakdown_by_machine")?;
        let _perf = PerfGuard::new("api.breakdown_by_machine");

        Ok(self.engine.breakdown_by_machine(start, end).await?)
    }

    /// 按产品分解（OEE 降序，近似值）
    pub async fn breakdown_by_product(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<Vec<OeeBreakdownEntry>> {
        self.guard("breakdown_by_product")?;
        let _perf = PerfGuard::new("api.breakdown_by_product");

        Ok(self.engine.breakdown_by_product(start, end).await?)
    }

    // ==========================================
    // 趋势
    // ==========================================

    /// 趋势序列
    ///
    /// # 参数
    /// - target: 目标值；None 时取配置 oee_target_pct
    pub async fn trend(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: TrendInterval,
        target: Option<f64>,
    ) -> ApiResult<Vec<OeeTrendPoint>> {
        self.guard("trend")?;
        let _perf = PerfGuard::new("api.trend");
        validate_machine_id(machine_id)?;

        let target = match target {
            Some(v) => v,
            None => self.default_target().await,
        };
        validate_percent("target", target)?;

        Ok(self
            .engine
            .trend(machine_id, start, end, interval, target)
            .await?)
    }

    // ==========================================
    // 告警
    // ==========================================

    /// OEE 告警（最差在前）
    ///
    /// # 参数
    /// - threshold: 阈值；None 时取配置 oee_alert_threshold_pct
    pub async fn alerts(
        &self,
        threshold: Option<f64>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<Vec<OeeAlert>> {
        self.guard("alerts")?;
        let _perf = PerfGuard::new("api.alerts");

        let threshold = match threshold {
            Some(v) => v,
            None => self.default_threshold().await,
        };
        validate_percent("threshold", threshold)?;

        Ok(self.engine.alerts(threshold, start, end).await?)
    }

    // ==========================================
    // 指标快照
    // ==========================================

    /// 计算并写入快照
    pub async fn store_snapshot(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<MachineMetrics> {
        self.guard("store_snapshot")?;
        let _perf = PerfGuard::new("api.store_snapshot");
        validate_machine_id(machine_id)?;

        Ok(self.engine.store_snapshot(machine_id, start, end).await?)
    }

    /// 查询历史快照
    pub async fn historical_metrics(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<Vec<MachineMetrics>> {
        self.guard("historical_metrics")?;
        let _perf = PerfGuard::new("api.historical_metrics");
        validate_machine_id(machine_id)?;

        Ok(self
            .engine
            .historical_metrics(machine_id, start, end)
            .await?)
    }

    // ==========================================
    // 配置默认值
    // ==========================================

    async fn default_threshold(&self) -> f64 {
        match self.config.get_alert_threshold_pct().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "读取告警阈值失败，使用默认值");
                defaults::ALERT_THRESHOLD_PCT
            }
        }
    }

    async fn default_target(&self) -> f64 {
        match self.config.get_target_pct().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "读取目标值失败，使用默认值");
                defaults::TARGET_PCT
            }
        }
    }
}

// ==========================================
// 入参校验
// ==========================================

fn validate_machine_id(machine_id: &str) -> ApiResult<()> {
    if machine_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("机台ID不能为空".to_string()));
    }
    Ok(())
}

fn validate_percent(field: &str, value: f64) -> ApiResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ApiError::InvalidInput(format!(
            "{} 必须在 0-100 之间: {}",
            field, value
        )));
    }
    Ok(())
}
