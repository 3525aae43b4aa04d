// ==========================================
// 花卉供货导入 - API层错误类型
// ==========================================
// 职责: 将导入/仓储层错误转换为面向用户的错误消息
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 导入错误
    // ==========================================
    #[error("该文件已于 {imported_at} 导入（供货记录 {supply_id}），如需重新导入请使用强制导入")]
    DuplicateFile {
        supply_id: String,
        imported_at: DateTime<Utc>,
    },

    #[error("文件导入失败 [{code}]: {message}")]
    ImportFailed { code: &'static str, message: String },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 稳定的错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DuplicateFile { .. } => "DUPLICATE_CHECKSUM",
            ApiError::ImportFailed { code, .. } => *code,
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::DatabaseError(_) | ApiError::DatabaseConnectionError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::DuplicateChecksum {
                supply_id,
                imported_at,
            } => ApiError::DuplicateFile {
                supply_id,
                imported_at,
            },
            ImportError::Persistence(repo_err) => ApiError::from(repo_err),
            other => ApiError::ImportFailed {
                code: other.code(),
                message: other.to_string(),
            },
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_conversion_keeps_code() {
        let err = ApiError::from(ImportError::EmptyFile("x.csv".to_string()));
        assert_eq!(err.code(), "VALIDATION_FAILED");

        let err = ApiError::from(ImportError::DuplicateChecksum {
            supply_id: "s-1".to_string(),
            imported_at: Utc::now(),
        });
        assert_eq!(err.code(), "DUPLICATE_CHECKSUM");
        assert!(err.to_string().contains("s-1"));

        let err = ApiError::from(ImportError::Persistence(RepositoryError::NotFound {
            entity: "Supply".to_string(),
            id: "s-2".to_string(),
        }));
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
