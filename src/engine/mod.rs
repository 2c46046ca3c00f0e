// ==========================================
// OEE 分析引擎 - 引擎层
// ==========================================
// 职责: 实现 OEE 计算与聚合规则,不拼 SQL
// 组成: 指标计算器 / 维度分解 / 趋势采样 / 告警判定 / 分析服务
// ==========================================

pub mod alert;
pub mod analytics;
pub mod breakdown;
pub mod data_source;
pub mod error;
pub mod oee_calculator;
pub mod trend;

// 重导出核心引擎
pub use analytics::{Clock, OeeAnalyticsEngine};
pub use data_source::{OeeDataSource, SqliteOeeDataSource};
pub use error::{EngineResult, OeeError};
pub use oee_calculator::OeeCalculator;
