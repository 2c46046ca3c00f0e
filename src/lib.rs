// ==========================================
// OEE 分析引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 设备综合效率 (OEE) 计算、分解、趋势、告警与快照
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 计算与聚合规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 性能统计
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 服务装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AlertSeverity, MachineStatus, TrendInterval};

// 领域实体
pub use domain::{
    Machine, MachineDowntime, MachineMetrics, OeeAlert, OeeBreakdownEntry, OeeResult,
    OeeTrendPoint, Product, ProductionRun,
};

// 引擎
pub use engine::{OeeAnalyticsEngine, OeeCalculator, OeeDataSource, OeeError};

// API
pub use api::{ApiError, OeeApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "OEE 分析引擎";
