// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use oee_analytics::config::{ConfigResult, OeeConfigReader};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub alert_threshold_pct: f64,
    pub target_pct: f64,
    pub max_concurrency: usize,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
    /// 为 true 时所有读取都返回错误（验证默认值回落）
    pub broken: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            alert_threshold_pct: 85.0,
            target_pct: 85.0,
            max_concurrency: 4,
            rate_limit_max_requests: 120,
            rate_limit_window_secs: 60,
            broken: false,
        }
    }
}

impl MockConfig {
    /// 自定义阈值/目标值
    pub fn with_threshold_and_target(threshold: f64, target: f64) -> Self {
        Self {
            alert_threshold_pct: threshold,
            target_pct: target,
            ..Self::default()
        }
    }

    /// 自定义并发上限
    pub fn with_concurrency(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            ..Self::default()
        }
    }

    /// 读取全部失败
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn read<T>(&self, value: T) -> ConfigResult<T> {
        if self.broken {
            return Err("mock config unavailable".into());
        }
        Ok(value)
    }
}

#[async_trait]
impl OeeConfigReader for MockConfig {
    async fn get_alert_threshold_pct(&self) -> ConfigResult<f64> {
        self.read(self.alert_threshold_pct)
    }

    async fn get_target_pct(&self) -> ConfigResult<f64> {
        self.read(self.target_pct)
    }

    async fn get_max_concurrency(&self) -> ConfigResult<usize> {
        self.read(self.max_concurrency)
    }

    async fn get_rate_limit_max_requests(&self) -> ConfigResult<u32> {
        self.read(self.rate_limit_max_requests)
    }

    async fn get_rate_limit_window_secs(&self) -> ConfigResult<u64> {
        self.read(self.rate_limit_window_secs)
    }
}
