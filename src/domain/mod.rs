// ==========================================
// 花卉供货导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑，不含导入流程逻辑
// ==========================================

pub mod catalog;
pub mod sheet;
pub mod supply;
pub mod types;

// 重导出核心类型
pub use catalog::{Flower, NewFlower, NewVariant, Variant, VariantUpdate};
pub use sheet::{
    cell_at, Cell, ColumnMapping, FileMetadata, FormatDetectionResult, ParsedRow, Sheet,
};
pub use supply::{
    ImportOptions, ImportResult, ImportStats, NormalizedRow, NormalizedSnapshot, RowError,
    RowWarning, SupplyRecord, SupplyRowEntry, SupplySummary, UpsertCounts,
};
pub use types::{RowOutcome, SheetFormat, StockMode, SupplyStatus};
