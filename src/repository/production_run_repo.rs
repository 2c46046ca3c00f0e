// ==========================================
// OEE 分析引擎 - 生产批次仓储
// ==========================================
// 职责: 管理 production_run 表
// 查询窗口: start_time ∈ [start, end)
// ==========================================

use crate::db::{format_ts, open_sqlite_connection, parse_opt_ts, parse_ts, PRODUCTION_RUN_DDL};
use crate::domain::production::ProductionRun;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT run_id, machine_id, product_id, start_time, end_time,
           quantity_produced, good_quantity, rejected_quantity
    FROM production_run
"#;

pub struct ProductionRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionRunRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(PRODUCTION_RUN_DDL)?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<ProductionRun> {
        let start_time: String = row.get(3)?;
        Ok(ProductionRun {
            run_id: row.get(0)?,
            machine_id: row.get(1)?,
            product_id: row.get(2)?,
            start_time: parse_ts(3, &start_time)?,
            end_time: parse_opt_ts(4, row.get(4)?)?,
            quantity_produced: row.get(5)?,
            good_quantity: row.get(6)?,
            rejected_quantity: row.get(7)?,
        })
    }

    /// 插入生产批次
    pub fn insert(&self, run: &ProductionRun) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_run (
                run_id, machine_id, product_id, start_time, end_time,
                quantity_produced, good_quantity, rejected_quantity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                run.run_id,
                run.machine_id,
                run.product_id,
                format_ts(&run.start_time),
                run.end_time.as_ref().map(format_ts),
                run.quantity_produced,
                run.good_quantity,
                run.rejected_quantity,
            ],
        )?;
        Ok(())
    }

    /// 查询某机台在窗口内开始的生产批次
    pub fn list_by_machine_in_range(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<ProductionRun>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE machine_id = ?1 AND start_time >= ?2 AND start_time < ?3 ORDER BY start_time ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![machine_id, format_ts(&start), format_ts(&end)],
                Self::map_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询窗口内开始的全部生产批次（按产品分解用）
    pub fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<ProductionRun>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE start_time >= ?1 AND start_time < ?2 ORDER BY start_time ASC, run_id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![format_ts(&start), format_ts(&end)], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
