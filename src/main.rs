// ==========================================
// 花卉供货导入 - 命令行入口
// ==========================================
// 子命令:
// - import  <FILE>   导入供货单（xlsx/xls/csv）
// - history          最近的供货记录
// - show    <ID>     单条供货记录明细
// - config  <KEY> <VALUE>  写入全局配置
// 输出: JSON 到 stdout，日志到 stderr
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flower_supply_import::api::ImportApi;
use flower_supply_import::db::{get_default_db_path, DB_PATH_ENV};
use flower_supply_import::domain::{ImportOptions, StockMode};
use flower_supply_import::logging::{self, LogFormat};
use serde::Serialize;
use std::path::PathBuf;

/// 花卉供货发票导入工具
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite 数据库路径（默认使用用户数据目录）
    #[arg(long, global = true, env = DB_PATH_ENV)]
    db: Option<PathBuf>,

    /// 日志格式
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 导入一份供货单
    Import {
        file: PathBuf,

        /// 只解析与校验，不写库存
        #[arg(long)]
        dry_run: bool,

        /// 库存模式（默认取配置 default_stock_mode）
        #[arg(long, value_enum)]
        stock_mode: Option<StockModeArg>,

        /// 跳过重复文件检查
        #[arg(long)]
        force: bool,

        /// 覆盖所有行的空运单号
        #[arg(long)]
        awb: Option<String>,

        /// 覆盖所有行的供应商
        #[arg(long)]
        supplier: Option<String>,

        /// 操作人
        #[arg(long)]
        user: Option<String>,
    },
    /// 最近的供货记录
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// 查看单条供货记录
    Show { supply_id: String },
    /// 写入全局配置（markup_factor / eur_rate / default_stock_mode）
    Config { key: String, value: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StockModeArg {
    Replace,
    Add,
    Skip,
}

impl From<StockModeArg> for StockMode {
    fn from(arg: StockModeArg) -> Self {
        match arg {
            StockModeArg::Replace => StockMode::Replace,
            StockModeArg::Add => StockMode::Add,
            StockModeArg::Skip => StockMode::Skip,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormatArg {
    Text,
    Json,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("序列化输出失败")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_format(match cli.log_format {
        LogFormatArg::Text => LogFormat::Text,
        LogFormatArg::Json => LogFormat::Json,
    });

    let db_path = cli
        .db
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(get_default_db_path);
    tracing::info!(version = flower_supply_import::VERSION, db_path = %db_path, "{}", flower_supply_import::APP_NAME);

    let api = ImportApi::new(db_path);

    match cli.command {
        Commands::Import {
            file,
            dry_run,
            stock_mode,
            force,
            awb,
            supplier,
            user,
        } => {
            let options = ImportOptions {
                dry_run,
                force_import: force,
                awb,
                supplier,
                user_id: user,
                ..ImportOptions::default()
            };
            let response = api
                .import_supply(&file.to_string_lossy(), stock_mode.map(StockMode::from), options)
                .await
                .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;
            print_json(&response)?;
        }
        Commands::History { limit } => {
            let supplies = api.list_recent_supplies(limit).await?;
            print_json(&supplies)?;
        }
        Commands::Show { supply_id } => {
            let record = api.get_supply(&supply_id).await?;
            print_json(&record)?;
        }
        Commands::Config { key, value } => {
            api.set_config(&key, &value)?;
            tracing::info!(key = %key, value = %value, "配置已写入");
        }
    }

    Ok(())
}
