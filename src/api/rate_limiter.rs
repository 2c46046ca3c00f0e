// ==========================================
// OEE 分析引擎 - 请求限流
// ==========================================
// 职责: 进程内固定窗口计数器，按操作键限流
// 用法: API 方法入口显式调用 check(key)，不使用注解/装饰器
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

// ==========================================
// RateLimiter - 固定窗口限流器
// ==========================================
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// 创建限流器
    ///
    /// # 参数
    /// - max_requests: 每个窗口允许的请求数（0 表示全部拒绝）
    /// - window: 窗口长度
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// 登记一次请求；超出窗口配额时返回 RateLimited
    pub fn check(&self, key: &str) -> ApiResult<()> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> ApiResult<()> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|e| ApiError::InternalError(format!("限流器锁获取失败: {}", e)))?;

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.started_at);
            let retry_after = self.window.saturating_sub(elapsed);
            tracing::warn!(key, limit = self.max_requests, "请求被限流");
            return Err(ApiError::RateLimited {
                key: key.to_string(),
                limit: self.max_requests,
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        entry.count += 1;
        Ok(())
    }
}
