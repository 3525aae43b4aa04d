// ==========================================
// 测试数据构造
// ==========================================

use flower_supply_import::domain::sheet::{ColumnMapping, FileMetadata, FormatDetectionResult, ParsedRow};
use flower_supply_import::domain::types::SheetFormat;
use flower_supply_import::importer::ParsedSheet;
use rust_decimal::Decimal;

/// 金额字面量
pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

/// 构造一行已解析数据（行号从 2 开始对应表头下第一行）
pub fn row(row_number: usize, variety: &str, grade: &str, units: f64, price: &str, supplier: &str) -> ParsedRow {
    ParsedRow::new(row_number, variety, grade, units, dec(price)).with_supplier(supplier)
}

/// 以通用表头版式包装已解析行
pub fn sheet(rows: Vec<ParsedRow>) -> ParsedSheet {
    sheet_with_metadata(rows, FileMetadata::default())
}

pub fn sheet_with_metadata(rows: Vec<ParsedRow>, metadata: FileMetadata) -> ParsedSheet {
    ParsedSheet {
        detection: FormatDetectionResult {
            format: SheetFormat::GenericHeader,
            columns: ColumnMapping::default(),
            header_row: Some(0),
            data_start_row: 1,
            metadata,
        },
        rows,
    }
}
