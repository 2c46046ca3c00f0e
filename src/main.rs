// ==========================================
// OEE 分析引擎 - 命令行入口
// ==========================================
// 输出: stdout 为 JSON 报表，日志写 stderr
// ==========================================

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use oee_analytics::app::{get_default_db_path, AppState};
use oee_analytics::domain::types::TrendInterval;
use oee_analytics::{i18n, logging};

/// OEE 分析引擎命令行
#[derive(Debug, Parser)]
#[command(name = "oee-analytics", version, about, long_about = None)]
struct Cli {
    /// 数据库文件路径（默认: OEE_ANALYTICS_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 消息语言（zh-CN / en）
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 输出最近窗口的机台/产品分解与告警
    Report {
        /// 窗口长度（小时，截止当前时刻）
        #[arg(long, default_value_t = 24)]
        hours: i64,
        /// 告警阈值（缺省取配置）
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// 输出单机台趋势序列
    Trend {
        #[arg(long)]
        machine: String,
        #[arg(long, default_value_t = 24)]
        hours: i64,
        /// hour / day / week
        #[arg(long, default_value = "hour")]
        interval: String,
        /// 目标值（缺省取配置）
        #[arg(long)]
        target: Option<f64>,
    },
    /// 计算并保存单机台快照
    Snapshot {
        #[arg(long)]
        machine: String,
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
    /// 查询单机台历史快照
    History {
        #[arg(long)]
        machine: String,
        #[arg(long, default_value_t = 168)]
        hours: i64,
    },
    /// 写入全局配置项
    ConfigSet { key: String, value: String },
}

#[derive(Serialize)]
struct Report<T, U, V> {
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    by_machine: T,
    by_product: U,
    alerts: V,
}

fn recent_window(hours: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if hours <= 0 {
        return Err(anyhow!("hours 必须大于 0: {}", hours));
    }
    let end = Utc::now();
    Ok((end - Duration::hours(hours), end))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(locale) = &cli.locale {
        i18n::set_locale(locale);
    }

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path)
        .await
        .map_err(|e| anyhow!(e))
        .context("初始化AppState失败")?;
    let api = state.oee_api.clone();

    match cli.command {
        Commands::Report { hours, threshold } => {
            let (start, end) = recent_window(hours)?;
            let by_machine = api.breakdown_by_machine(start, end).await?;
            let by_product = api.breakdown_by_product(start, end).await?;
            let alerts = api.alerts(threshold, start, end).await?;
            print_json(&Report {
                period_start: start,
                period_end: end,
                by_machine,
                by_product,
                alerts,
            })
        }
        Commands::Trend {
            machine,
            hours,
            interval,
            target,
        } => {
            let interval = TrendInterval::parse(&interval)
                .ok_or_else(|| anyhow!("未知的趋势粒度: {}", interval))?;
            let (start, end) = recent_window(hours)?;
            let points = api.trend(&machine, start, end, interval, target).await?;
            print_json(&points)
        }
        Commands::Snapshot { machine, hours } => {
            let (start, end) = recent_window(hours)?;
            let metrics = api.store_snapshot(&machine, start, end).await?;
            print_json(&metrics)
        }
        Commands::History { machine, hours } => {
            let (start, end) = recent_window(hours)?;
            let rows = api.historical_metrics(&machine, start, end).await?;
            print_json(&rows)
        }
        Commands::ConfigSet { key, value } => {
            let config = &state.config_manager;
            config
                .set_global_config_value(&key, &value)
                .map_err(|e| anyhow!("写入配置失败: {}", e))?;
            let stored = config
                .get_global_config_value(&key)
                .map_err(|e| anyhow!("读取配置失败: {}", e))?;
            println!("{}: {} = {}", i18n::t("common.success"), key, stored.unwrap_or_default());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    logging::init();

    tracing::info!(version = oee_analytics::VERSION, "{}", oee_analytics::APP_NAME);

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "命令执行失败");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
