// ==========================================
// OEE 分析引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod downtime_repo;
pub mod error;
pub mod machine_metrics_repo;
pub mod machine_repo;
pub mod product_repo;
pub mod production_run_repo;

// 重导出核心仓储
pub use downtime_repo::DowntimeRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use machine_metrics_repo::MachineMetricsRepository;
pub use machine_repo::MachineRepository;
pub use product_repo::ProductRepository;
pub use production_run_repo::ProductionRunRepository;
