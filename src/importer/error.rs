// ==========================================
// 花卉供货导入 - 导入模块错误类型
// ==========================================
// 职责: 致命错误（中止整次导入）
// 行级错误与警告不走这里，见 domain::supply::{RowError, RowWarning}
// ==========================================

use crate::repository::error::RepositoryError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件为空: {0}")]
    EmptyFile(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("表格读取失败: {0}")]
    SheetReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 导入前置检查 =====
    #[error("重复文件: 已于 {imported_at} 导入（供货记录 {supply_id}）")]
    DuplicateChecksum {
        supply_id: String,
        imported_at: DateTime<Utc>,
    },

    #[error("数据校验失败: {0}")]
    ValidationFailed(String),

    // ===== 外部依赖错误 =====
    #[error("汇率不可用: {0}")]
    RateUnavailable(String),

    #[error("持久化失败: {0}")]
    Persistence(#[from] RepositoryError),
}

impl ImportError {
    /// 稳定的错误码（供调用方生成面向用户的提示）
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::EmptyFile(_) | ImportError::ValidationFailed(_) => "VALIDATION_FAILED",
            ImportError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ImportError::SheetReadError(_) | ImportError::CsvParseError(_) => "PARSE_FAILED",
            ImportError::DuplicateChecksum { .. } => "DUPLICATE_CHECKSUM",
            ImportError::RateUnavailable(_) => "RATE_UNAVAILABLE",
            ImportError::Persistence(_) => "PERSISTENCE_FAILED",
        }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError> / From<calamine::XlsError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::SheetReadError(err.to_string())
    }
}

impl From<calamine::XlsError> for ImportError {
    fn from(err: calamine::XlsError) -> Self {
        ImportError::SheetReadError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
