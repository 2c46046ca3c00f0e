// ==========================================
// OEE 分析引擎 - 指标快照仓储
// ==========================================
// 职责: 管理 machine_metrics 表
// 约束: 只追加，不提供 update/delete，不去重
// ==========================================

use crate::db::{format_ts, open_sqlite_connection, parse_ts, MACHINE_METRICS_DDL};
use crate::domain::oee::{MachineMetrics, OeeResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct MachineMetricsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MachineMetricsRepository {
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
        conn.execute_batch(MACHINE_METRICS_DDL)?;
        Ok(())
    }

    /// 追加一条快照
    pub fn append(&self, metrics: &MachineMetrics) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let r = &metrics.result;
        conn.execute(
            r#"
            INSERT INTO machine_metrics (
                metrics_id, machine_id, recorded_at, period_start, period_end,
                oee, availability, performance, quality,
                planned_production_time, actual_run_time, planned_downtime, unplanned_downtime,
                ideal_cycle_time, total_units_produced, good_units_produced, rejected_units
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                metrics.metrics_id,
                metrics.machine_id,
                format_ts(&metrics.recorded_at),
                format_ts(&metrics.period_start),
                format_ts(&metrics.period_end),
                r.oee,
                r.availability,
                r.performance,
                r.quality,
                r.planned_production_time,
                r.actual_run_time,
                r.planned_downtime,
                r.unplanned_downtime,
                r.ideal_cycle_time,
                r.total_units_produced,
                r.good_units_produced,
                r.rejected_units,
            ],
        )?;
        Ok(())
    }

    /// 按机台 + 写入时刻范围查询（闭区间，按 recorded_at 升序）
    pub fn list_by_machine_in_range(
        &self,
        machine_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<MachineMetrics>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                metrics_id, machine_id, recorded_at, period_start, period_end,
                oee, availability, performance, quality,
                planned_production_time, actual_run_time, planned_downtime, unplanned_downtime,
                ideal_cycle_time, total_units_produced, good_units_produced, rejected_units
            FROM machine_metrics
            WHERE machine_id = ?1 AND recorded_at >= ?2 AND recorded_at <= ?3
            ORDER BY recorded_at ASC, metrics_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![machine_id, format_ts(&start), format_ts(&end)],
                |row| {
                    let recorded_at: String = row.get(2)?;
                    let period_start: String = row.get(3)?;
                    let period_end: String = row.get(4)?;
                    Ok(MachineMetrics {
                        metrics_id: row.get(0)?,
                        machine_id: row.get(1)?,
                        recorded_at: parse_ts(2, &recorded_at)?,
                        period_start: parse_ts(3, &period_start)?,
                        period_end: parse_ts(4, &period_end)?,
                        result: OeeResult {
                            oee: row.get(5)?,
                            availability: row.get(6)?,
                            performance: row.get(7)?,
                            quality: row.get(8)?,
                            planned_production_time: row.get(9)?,
                            actual_run_time: row.get(10)?,
                            planned_downtime: row.get(11)?,
                            unplanned_downtime: row.get(12)?,
                            ideal_cycle_time: row.get(13)?,
                            total_units_produced: row.get(14)?,
                            good_units_produced: row.get(15)?,
                            rejected_units: row.get(16)?,
                        },
                    })
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
