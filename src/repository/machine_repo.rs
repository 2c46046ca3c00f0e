// ==========================================
// OEE 分析引擎 - 机台仓储
// ==========================================
// 职责: 管理 machine 表 (机台参考数据)
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::{format_ts, open_sqlite_connection, parse_ts, MACHINE_DDL};
use crate::domain::machine::Machine;
use crate::domain::types::MachineStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT machine_id, machine_name, target_speed, status, created_at, updated_at
    FROM machine
"#;

pub struct MachineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MachineRepository {
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

    /// 确保表存在（如果不存在则创建）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(MACHINE_DDL)?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<Machine> {
        let status: String = row.get(3)?;
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;
        Ok(Machine {
            machine_id: row.get(0)?,
            machine_name: row.get(1)?,
            target_speed: row.get(2)?,
            status: MachineStatus::from_str(&status),
            created_at: parse_ts(4, &created_at)?,
            updated_at: parse_ts(5, &updated_at)?,
        })
    }

    /// 创建或更新机台（Upsert 操作）
    pub fn upsert(&self, machine: &Machine) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO machine (
                machine_id, machine_name, target_speed, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(machine_id) DO UPDATE SET
                machine_name = excluded.machine_name,
                target_speed = excluded.target_speed,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
            params![
                machine.machine_id,
                machine.machine_name,
                machine.target_speed,
                machine.status.to_db_str(),
                format_ts(&machine.created_at),
                format_ts(&machine.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 按主键查找机台
    pub fn find_by_id(&self, machine_id: &str) -> RepositoryResult<Option<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE machine_id = ?1", SELECT_COLUMNS);
        let result = conn.query_row(&sql, params![machine_id], Self::map_row);

        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出全部机台（按机台ID排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY machine_id ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按状态列出机台
    pub fn list_by_status(&self, status: MachineStatus) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE status = ?1 ORDER BY machine_id ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![status.to_db_str()], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 更新机台状态
    pub fn update_status(&self, machine_id: &str, status: MachineStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE machine SET status = ?1, updated_at = ?2 WHERE machine_id = ?3",
            params![status.to_db_str(), format_ts(&Utc::now()), machine_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Machine".to_string(),
                id: machine_id.to_string(),
            });
        }
        Ok(())
    }
}
