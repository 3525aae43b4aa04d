// ==========================================
// 花卉供货导入 - 配置管理器
// ==========================================
// 职责: 配置查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::configure_sqlite_connection;
use crate::domain::types::StockMode;
use crate::engine::pricing::DEFAULT_MARKUP_FACTOR;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const MARKUP_FACTOR: &str = "markup_factor";
    pub const EUR_RATE: &str = "eur_rate";
    pub const DEFAULT_STOCK_MODE: &str = "default_stock_mode";
}

/// 未配置时的兜底汇率
pub const DEFAULT_EUR_RATE: Decimal = Decimal::from_parts(45, 0, 0, false, 0);

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取正数配置，缺失或格式错误时用默认值
    fn get_positive_decimal(&self, key: &str, default: Decimal) -> RepositoryResult<Decimal> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match Decimal::from_str(raw.trim()) {
            Ok(v) if v > Decimal::ZERO => Ok(v),
            _ => {
                warn!(config_key = key, raw_value = %raw, "配置值非法，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_markup_factor(&self) -> RepositoryResult<Decimal> {
        self.get_positive_decimal(config_keys::MARKUP_FACTOR, DEFAULT_MARKUP_FACTOR)
    }

    async fn get_eur_rate(&self) -> RepositoryResult<Decimal> {
        self.get_positive_decimal(config_keys::EUR_RATE, DEFAULT_EUR_RATE)
    }

    async fn get_default_stock_mode(&self) -> RepositoryResult<StockMode> {
        let Some(raw) = self.get_config_value(config_keys::DEFAULT_STOCK_MODE)? else {
            return Ok(StockMode::default());
        };
        Ok(raw.parse::<StockMode>().unwrap_or_else(|e| {
            warn!(config_key = config_keys::DEFAULT_STOCK_MODE, raw_value = %raw, error = %e, "库存模式配置非法，使用 replace");
            StockMode::default()
        }))
    }
}
