// ==========================================
// OEE 分析引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一时间戳存储格式（定长 RFC3339 纳秒 UTC，可按字符串比较）
// ==========================================

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// 表结构 DDL（各仓储 ensure_table 复用）
// ==========================================

pub const SCHEMA_VERSION_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
"#;

pub const CONFIG_KV_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS config_kv (
        scope_id TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (scope_id, key)
    );
"#;

pub const MACHINE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS machine (
        machine_id TEXT PRIMARY KEY,
        machine_name TEXT NOT NULL,
        target_speed REAL NOT NULL DEFAULT 0,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

pub const PRODUCT_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS product (
        product_id TEXT PRIMARY KEY,
        product_name TEXT NOT NULL
    );
"#;

pub const PRODUCTION_RUN_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS production_run (
        run_id TEXT PRIMARY KEY,
        machine_id TEXT NOT NULL,
        product_id TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT,
        quantity_produced INTEGER NOT NULL DEFAULT 0,
        good_quantity INTEGER NOT NULL DEFAULT 0,
        rejected_quantity INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_production_run_machine_start
        ON production_run(machine_id, start_time);
    CREATE INDEX IF NOT EXISTS idx_production_run_start
        ON production_run(start_time);
"#;

pub const MACHINE_DOWNTIME_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS machine_downtime (
        downtime_id TEXT PRIMARY KEY,
        machine_id TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT,
        category TEXT NOT NULL,
        reason TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_machine_downtime_machine_start
        ON machine_downtime(machine_id, start_time);
"#;

pub const MACHINE_METRICS_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS machine_metrics (
        metrics_id TEXT PRIMARY KEY,
        machine_id TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        period_start TEXT NOT NULL,
        period_end TEXT NOT NULL,
        oee REAL NOT NULL,
        availability REAL NOT NULL,
        performance REAL NOT NULL,
        quality REAL NOT NULL,
        planned_production_time REAL NOT NULL,
        actual_run_time REAL NOT NULL,
        planned_downtime REAL NOT NULL,
        unplanned_downtime REAL NOT NULL,
        ideal_cycle_time REAL NOT NULL,
        total_units_produced INTEGER NOT NULL,
        good_units_produced INTEGER NOT NULL,
        rejected_units INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_machine_metrics_machine_recorded
        ON machine_metrics(machine_id, recorded_at);
"#;

/// 建立全部业务表并登记 schema_version（幂等）
///
/// 各仓储构造时也会各自 ensure_table，这里用于一次性初始化新库
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    for ddl in [
        SCHEMA_VERSION_DDL,
        CONFIG_KV_DDL,
        MACHINE_DDL,
        PRODUCT_DDL,
        PRODUCTION_RUN_DDL,
        MACHINE_DOWNTIME_DDL,
        MACHINE_METRICS_DDL,
    ] {
        conn.execute_batch(ddl)?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

// ==========================================
// 时间戳编解码
// ==========================================

/// DateTime<Utc> -> 定长文本，例如 2026-03-01T08:00:00.000000000Z
///
/// 保留全部纳秒位：窗口比较与读回的值都与内存中的 DateTime 完全一致。
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// 文本 -> DateTime<Utc>（用于 row 映射，col 为列序号）
pub fn parse_ts(col: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(e)))
}

/// 可空时间戳列
pub fn parse_opt_ts(col: usize, raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_ts(col, &s)).transpose()
}
