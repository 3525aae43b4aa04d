// ==========================================
// 花卉供货导入 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: SQLite 约束错误按扩展错误码分类（slug 唯一、规格唯一、外键）
// ==========================================

use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 记录定位 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    // ===== 连接与锁 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    // ===== SQL 执行 =====
    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 列值与 JSON 列 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    #[error("JSON 序列化失败: {0}")]
    SerializationError(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let detail = msg.clone().unwrap_or_else(|| err.to_string());
                match (code.code, code.extended_code) {
                    (ErrorCode::ConstraintViolation, ffi::SQLITE_CONSTRAINT_UNIQUE)
                    | (ErrorCode::ConstraintViolation, ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
                        RepositoryError::UniqueConstraintViolation(detail)
                    }
                    (ErrorCode::ConstraintViolation, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                        RepositoryError::ForeignKeyViolation(detail)
                    }
                    (ErrorCode::CannotOpen, _) | (ErrorCode::NotADatabase, _) => {
                        RepositoryError::DatabaseConnectionError(detail)
                    }
                    _ => RepositoryError::DatabaseQueryError(detail),
                }
            }
            rusqlite::Error::FromSqlConversionFailure(idx, _, source) => RepositoryError::FieldValueError {
                field: format!("column#{}", idx),
                message: source.to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_constraint_errors_are_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE f (id TEXT PRIMARY KEY, slug TEXT UNIQUE);
             CREATE TABLE v (id TEXT PRIMARY KEY, flower_id TEXT REFERENCES f(id));
             INSERT INTO f VALUES ('1', 'freedom');",
        )
        .unwrap();

        let dup = conn.execute("INSERT INTO f VALUES ('2', 'freedom')", []).unwrap_err();
        assert!(matches!(RepositoryError::from(dup), RepositoryError::UniqueConstraintViolation(_)));

        let orphan = conn.execute("INSERT INTO v VALUES ('v1', 'missing')", []).unwrap_err();
        assert!(matches!(RepositoryError::from(orphan), RepositoryError::ForeignKeyViolation(_)));
    }
}
