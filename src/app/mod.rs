// ==========================================
// OEE 分析引擎 - 应用层
// ==========================================
// 职责: 组装服务容器,供命令行/嵌入方使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
