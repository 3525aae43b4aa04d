// ==========================================
// 花卉供货导入 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 建表幂等，首次打开数据库即可使用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL DEFAULT 'global',
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS flowers (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS variants (
    id          TEXT PRIMARY KEY,
    flower_id   TEXT NOT NULL REFERENCES flowers(id) ON DELETE CASCADE,
    length      INTEGER NOT NULL,
    grade       TEXT,
    stock       INTEGER NOT NULL,
    cost_price  TEXT NOT NULL,
    price       TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (flower_id, length)
);

CREATE TABLE IF NOT EXISTS supplies (
    id              TEXT PRIMARY KEY,
    filename        TEXT NOT NULL,
    checksum        TEXT NOT NULL,
    parsed_at       TEXT NOT NULL,
    awb             TEXT,
    supplier        TEXT,
    document_id     TEXT,
    ship_date       TEXT,
    transport_cost  TEXT,
    total_boxes     REAL,
    format          TEXT NOT NULL,
    total_rows      INTEGER NOT NULL,
    valid_rows      INTEGER NOT NULL,
    rows_json       TEXT NOT NULL,
    supply_status   TEXT NOT NULL,
    errors_json     TEXT NOT NULL,
    warnings_json   TEXT NOT NULL,
    uploaded_by     TEXT,
    published_at    TEXT
);

CREATE INDEX IF NOT EXISTS idx_supplies_checksum ON supplies(checksum);
CREATE INDEX IF NOT EXISTS idx_supplies_parsed_at ON supplies(parsed_at);
"#;

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

/// 建表（幂等）并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
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

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "FLOWER_SUPPLY_DB_PATH";

/// 默认数据库路径
///
/// 优先级: 环境变量 FLOWER_SUPPLY_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./flower_supply.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("flower-supply-import");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("flower_supply.db");
        }
    }

    path.to_string_lossy().to_string()
}
