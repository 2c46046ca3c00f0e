// ==========================================
// OEE 分析引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供展示层/命令行调用
// ==========================================

pub mod error;
pub mod oee_api;
pub mod rate_limiter;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use oee_api::OeeApi;
pub use rate_limiter::RateLimiter;
