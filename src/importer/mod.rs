// ==========================================
// 花卉供货导入 - 导入层
// ==========================================
// 职责: 供货单文件 → 解析 → 归一化 → 校验 → 入库 → 供货记录
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod cell_parser;
pub mod checksum;
pub mod error;
pub mod file_parser;
pub mod format_detector;
pub mod normalizer;
pub mod orchestrator;
pub mod parser;
pub mod row_extractor;
pub mod supply_importer_trait;
pub mod synonyms;
pub mod upserter;
pub mod validator;
pub mod variant_key;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvSheetReader, ExcelSheetReader, UniversalSheetReader};
pub use format_detector::{
    FormatDetector, FormatStrategy, GenericHeaderStrategy, HeaderKeywordStrategy,
    MetadataFirstStrategy,
};
pub use normalizer::Normalizer;
pub use orchestrator::SupplyImportOrchestrator;
pub use parser::{InvoiceParser, ParsedSheet};
pub use synonyms::SynonymTable;
pub use upserter::{SupplyUpserter, UpsertOutcome};
pub use validator::{validate, ValidationOutcome};
pub use variant_key::{variant_key, VariantKey};

// 重导出 Trait 接口
pub use supply_importer_trait::{SheetReader, SupplyImporter};
