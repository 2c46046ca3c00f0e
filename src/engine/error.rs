// ==========================================
// OEE 分析引擎 - 引擎层错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OeeError {
    #[error("机台不存在: machine_id={machine_id}")]
    MachineNotFound { machine_id: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("数据源错误: {0}")]
    DataSource(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, OeeError>;
