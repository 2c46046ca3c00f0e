// ==========================================
// OEE 分析引擎 - 配置读取 Trait
// ==========================================
// 职责: 定义分析引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 配置读取错误
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// OeeConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait OeeConfigReader: Send + Sync {
    // ===== 告警与目标 =====

    /// 默认告警阈值（百分比）
    ///
    /// # 默认值
    /// - 85.0
    async fn get_alert_threshold_pct(&self) -> ConfigResult<f64>;

    /// 默认趋势目标值（百分比）
    ///
    /// # 默认值
    /// - 85.0
    async fn get_target_pct(&self) -> ConfigResult<f64>;

    // ===== 计算并发 =====

    /// 按机台扇出计算时的并发上限（至少为 1）
    ///
    /// # 默认值
    /// - 4
    async fn get_max_concurrency(&self) -> ConfigResult<usize>;

    // ===== 限流 =====

    /// 每个限流窗口允许的请求数
    ///
    /// # 默认值
    /// - 120
    async fn get_rate_limit_max_requests(&self) -> ConfigResult<u32>;

    /// 限流窗口长度（秒）
    ///
    /// # 默认值
    /// - 60
    async fn get_rate_limit_window_secs(&self) -> ConfigResult<u64>;
}
