// ==========================================
// OEE 分析引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::oee_config_trait::{ConfigResult, OeeConfigReader};
use crate::db::{open_sqlite_connection, CONFIG_KV_DDL};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            conn_guard.execute_batch(CONFIG_KV_DDL)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（Upsert）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 读取并解析配置值，缺失或格式错误时回落到默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// OeeConfigReader Trait 实现
// ==========================================
#[async_trait]
impl OeeConfigReader for ConfigManager {
    async fn get_alert_threshold_pct(&self) -> ConfigResult<f64> {
        self.get_parsed_or_default(
            config_keys::OEE_ALERT_THRESHOLD_PCT,
            defaults::ALERT_THRESHOLD_PCT,
        )
    }

    async fn get_target_pct(&self) -> ConfigResult<f64> {
        self.get_parsed_or_default(config_keys::OEE_TARGET_PCT, defaults::TARGET_PCT)
    }

    async fn get_max_concurrency(&self) -> ConfigResult<usize> {
        let value =
            self.get_parsed_or_default(config_keys::OEE_MAX_CONCURRENCY, defaults::MAX_CONCURRENCY)?;
        Ok(value.max(1))
    }

    async fn get_rate_limit_max_requests(&self) -> ConfigResult<u32> {
        self.get_parsed_or_default(
            config_keys::RATE_LIMIT_MAX_REQUESTS,
            defaults::RATE_LIMIT_MAX_REQUESTS,
        )
    }

    async fn get_rate_limit_window_secs(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(
            config_keys::RATE_LIMIT_WINDOW_SECS,
            defaults::RATE_LIMIT_WINDOW_SECS,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 告警与目标
    pub const OEE_ALERT_THRESHOLD_PCT: &str = "oee_alert_threshold_pct";
    pub const OEE_TARGET_PCT: &str = "oee_target_pct";

    // 计算并发
    pub const OEE_MAX_CONCURRENCY: &str = "oee_max_concurrency";

    // 限流
    pub const RATE_LIMIT_MAX_REQUESTS: &str = "rate_limit_max_requests";
    pub const RATE_LIMIT_WINDOW_SECS: &str = "rate_limit_window_secs";
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const ALERT_THRESHOLD_PCT: f64 = 85.0;
    pub const TARGET_PCT: f64 = 85.0;
    pub const MAX_CONCURRENCY: usize = 4;
    pub const RATE_LIMIT_MAX_REQUESTS: u32 = 120;
    pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
}
