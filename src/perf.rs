// ==========================================
// OEE 分析引擎 - 性能统计
// ==========================================
// 职责: SQLite 语句耗时采样 + 慢 SQL 告警 + 操作级统计
// 统计口径: 仅计入 PerfGuard 存活期间、当前线程上执行的语句
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub const ENV_PERF_SQL: &str = "OEE_ANALYTICS_PERF_SQL";
pub const ENV_SLOW_SQL_MS: &str = "OEE_ANALYTICS_SLOW_SQL_MS";

const SLOW_SQL_DEFAULT_DEBUG_MS: u64 = 50;
const SLOW_SQL_DEFAULT_RELEASE_MS: u64 = 200;
const SLOW_SQL_LOG_CHARS: usize = 300;

// ==========================================
// SqlPerfSettings - 采样开关与阈值
// ==========================================

/// SQL 采样配置
///
/// - `OEE_ANALYTICS_PERF_SQL`: 1/true/yes/on 开启，其它值关闭；未设置时 Debug 构建开启
/// - `OEE_ANALYTICS_SLOW_SQL_MS`: 慢 SQL 阈值（毫秒），0 表示只计数不告警
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlPerfSettings {
    pub enabled: bool,
    pub slow_threshold: Duration,
}

impl SqlPerfSettings {
    pub fn from_env() -> Self {
        let flag = std::env::var(ENV_PERF_SQL).ok();
        let slow_ms = std::env::var(ENV_SLOW_SQL_MS).ok();
        Self::from_values(flag.as_deref(), slow_ms.as_deref())
    }

    fn from_values(flag: Option<&str>, slow_ms: Option<&str>) -> Self {
        let enabled = flag.map(is_truthy).unwrap_or(cfg!(debug_assertions));
        let default_ms = if cfg!(debug_assertions) {
            SLOW_SQL_DEFAULT_DEBUG_MS
        } else {
            SLOW_SQL_DEFAULT_RELEASE_MS
        };
        let ms = slow_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(default_ms);

        Self {
            enabled,
            slow_threshold: Duration::from_millis(ms),
        }
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

// ==========================================
// 慢 SQL 阈值 + 线程局部计数
// ==========================================

static SLOW_THRESHOLD_US: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpStats {
    open_guards: u32,
    statements: u64,
    slow_statements: u64,
}

thread_local! {
    static STATS: Cell<OpStats> = const {
        Cell::new(OpStats { open_guards: 0, statements: 0, slow_statements: 0 })
    };
}

fn update_stats(f: impl FnOnce(&mut OpStats)) {
    STATS.with(|cell| {
        let mut stats = cell.get();
        f(&mut stats);
        cell.set(stats);
    });
}

/// 在连接上挂载 profile 回调；关闭时清除已有回调
pub fn install_sqlite_tracing(conn: &mut Connection) {
    apply_settings(conn, SqlPerfSettings::from_env());
}

fn apply_settings(conn: &mut Connection, settings: SqlPerfSettings) {
    SLOW_THRESHOLD_US.store(
        settings.slow_threshold.as_micros().min(u64::MAX as u128) as u64,
        Ordering::Relaxed,
    );

    if settings.enabled {
        conn.profile(Some(on_statement_finished));
    } else {
        conn.profile(None);
    }
}

fn on_statement_finished(sql: &str, elapsed: Duration) {
    record_statement(sql, elapsed);
}

/// 记录一条已执行语句，返回是否判定为慢 SQL
fn record_statement(sql: &str, elapsed: Duration) -> bool {
    let threshold_us = SLOW_THRESHOLD_US.load(Ordering::Relaxed);
    let slow = threshold_us > 0 && elapsed.as_micros() >= u128::from(threshold_us);

    if slow {
        tracing::warn!(
            target: "slow_sql",
            duration_ms = elapsed.as_millis() as u64,
            sql = %truncate_sql(sql, SLOW_SQL_LOG_CHARS),
            "slow sql"
        );
    }

    update_stats(|s| {
        if s.open_guards == 0 {
            return;
        }
        s.statements = s.statements.saturating_add(1);
        if slow {
            s.slow_statements = s.slow_statements.saturating_add(1);
        }
    });
    slow
}

/// 折叠空白并按字符截断
fn truncate_sql(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

// ==========================================
// PerfGuard - 操作级统计
// ==========================================

/// 作用域计时器，drop 时以 debug 级别输出 op / elapsed_ms / sql_count / slow_sql_count
///
/// 异步操作若在其它线程恢复，sql_count 只包含起始线程上的语句。
pub struct PerfGuard {
    op: &'static str,
    started_at: Instant,
    baseline: OpStats,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        update_stats(|s| s.open_guards = s.open_guards.saturating_add(1));
        Self {
            op,
            started_at: Instant::now(),
            baseline: STATS.with(Cell::get),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let now = STATS.with(Cell::get);
        let sql_count = now.statements.saturating_sub(self.baseline.statements);
        let slow_sql_count = now
            .slow_statements
            .saturating_sub(self.baseline.slow_statements);

        tracing::debug!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            sql_count,
            slow_sql_count,
            "done"
        );

        update_stats(|s| s.open_guards = s.open_guards.saturating_sub(1));
    }
}
