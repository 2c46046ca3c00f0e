// ==========================================
// OEE 分析引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod machine;
pub mod oee;
pub mod production;
pub mod types;

// 重导出核心类型
pub use machine::{Machine, Product};
pub use oee::{
    clamp_percent, compose_oee, MachineMetrics, OeeAlert, OeeBreakdownEntry, OeeResult,
    OeeTrendPoint,
};
pub use production::{MachineDowntime, ProductionRun};
pub use types::{AlertSeverity, MachineStatus, TrendInterval};
