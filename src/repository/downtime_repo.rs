// ==========================================
// OEE 分析引擎 - 停机记录仓储
// ==========================================
// 职责: 管理 machine_downtime 表
// 查询窗口: start_time ∈ [start, end)
// ==========================================

use crate::db::{format_ts, open_sqlite_connection, parse_opt_ts, parse_ts, MACHINE_DOWNTIME_DDL};
use crate::domain::production::MachineDowntime;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct DowntimeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DowntimeRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        {
            let conn = repo.get_conn()?;
            conn.execute_batch(MACHINE_DOWNTIME_DDL)?;
        }
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入停机记录
    pub fn insert(&self, downtime: &MachineDowntime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO machine_downtime (
                downtime_id, machine_id, start_time, end_time, category, reason
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                downtime.downtime_id,
                downtime.machine_id,
                format_ts(&downtime.start_time),
                downtime.end_time.as_ref().map(format_ts),
                downtime.category,
                downtime.reason,
            ],
        )?;
        Ok(())
    }

    /// 结束一条进行中的停机
    pub fn close(&self, downtime_id: &str, end_time: DateTime<Utc>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE machine_downtime SET end_time = ?1 WHERE downtime_id = ?2 AND end_time IS NULL",
            params![format_ts(&end_time), downtime_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MachineDowntime(open)".to_string(),
                id: downtime_id.to_string(),
            });
        }
        Ok(())
    }

    /// 查询某机台在窗口内开始的停机记录
    pub fn list_by_machine_in_range(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<MachineDowntime>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT downtime_id, machine_id, start_time, end_time, category, reason
            FROM machine_downtime
            WHERE machine_id = ?1 AND start_time >= ?2 AND start_time < ?3
            ORDER BY start_time ASC
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![machine_id, format_ts(&start), format_ts(&end)],
                |row| {
                    let start_time: String = row.get(2)?;
                    Ok(MachineDowntime {
                        downtime_id: row.get(0)?,
                        machine_id: row.get(1)?,
                        start_time: parse_ts(2, &start_time)?,
                        end_time: parse_opt_ts(3, row.get(3)?)?,
                        category: row.get(4)?,
                        reason: row.get(5)?,
                    })
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
