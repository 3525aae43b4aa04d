// ==========================================
// 花卉供货导入 - 供货单解析器
// ==========================================
// 职责: 字节 → 表格 → 版式识别 → 解析行
// 附带: 运费按箱分摊（箱按折算整箱数计权，箱内按枝数分）
// ==========================================

use crate::domain::sheet::{FormatDetectionResult, ParsedRow};
use crate::engine::pricing::round2;
use crate::importer::cell_parser::decimal_from_f64;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalSheetReader;
use crate::importer::format_detector::FormatDetector;
use crate::importer::row_extractor::extract_rows;
use crate::importer::supply_importer_trait::SheetReader;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

/// 解析产出
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub detection: FormatDetectionResult,
    pub rows: Vec<ParsedRow>,
}

// ==========================================
// InvoiceParser
// ==========================================
pub struct InvoiceParser {
    reader: Box<dyn SheetReader>,
    detector: FormatDetector,
}

impl Default for InvoiceParser {
    fn default() -> Self {
        Self::new(Box::new(UniversalSheetReader), FormatDetector::default())
    }
}

impl InvoiceParser {
    pub fn new(reader: Box<dyn SheetReader>, detector: FormatDetector) -> Self {
        Self { reader, detector }
    }

    /// 解析供货单
    ///
    /// # 错误
    /// - EmptyFile: 没有任何非空行（错误码 VALIDATION_FAILED）
    /// - SheetReadError / CsvParseError / UnsupportedFormat: 读取失败
    pub fn parse(&self, bytes: &[u8]) -> ImportResult<ParsedSheet> {
        let sheet = self.reader.read_sheet(bytes)?;
        if sheet.iter().all(|row| row.iter().all(|c| c.is_blank())) {
            return Err(ImportError::EmptyFile("表格中没有数据行".to_string()));
        }

        let detection = self.detector.detect(&sheet);
        let rows = extract_rows(&sheet, &detection);

        info!(
            format = %detection.format,
            sheet_rows = sheet.len(),
            parsed_rows = rows.len(),
            "供货单解析完成"
        );
        debug!(metadata = ?detection.metadata, "文件级元数据");

        Ok(ParsedSheet { detection, rows })
    }
}

// 分摊单位: 解析出的箱；手工构造的行没有箱序号时自成一箱
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BoxKey {
    Box(usize),
    Row(usize),
}

#[derive(Debug, Default)]
struct BoxShare {
    weight: Decimal,
    units: Decimal,
    members: u32,
}

fn box_key(row: &ParsedRow) -> BoxKey {
    match row.box_number {
        Some(number) => BoxKey::Box(number),
        None => BoxKey::Row(row.row_number),
    }
}

fn positive(value: Option<f64>) -> Option<Decimal> {
    value.and_then(decimal_from_f64).filter(|v| *v > Decimal::ZERO)
}

/// 运费分摊
///
/// 每箱的折算整箱数只计一次: 箱份额 = 运费 × 箱 FB / 全部箱 FB 之和，
/// 再按枝数分给箱内各行（枝数缺失时均分），结果保留 2 位小数。
/// 返回与 rows 等长的分摊额；无运费或无有效 box_fb 时全部为 None
pub fn allocate_transport_cost(rows: &[ParsedRow], transport_cost: Option<Decimal>) -> Vec<Option<Decimal>> {
    let Some(cost) = transport_cost.filter(|c| *c > Decimal::ZERO) else {
        return vec![None; rows.len()];
    };

    let mut boxes: HashMap<BoxKey, BoxShare> = HashMap::new();
    for row in rows {
        let Some(weight) = positive(row.box_fb) else { continue };
        let share = boxes.entry(box_key(row)).or_default();
        share.weight = weight;
        share.units += positive(Some(row.units)).unwrap_or_default();
        share.members += 1;
    }

    let total_weight: Decimal = boxes.values().map(|b| b.weight).sum();
    if total_weight <= Decimal::ZERO {
        return vec![None; rows.len()];
    }

    rows.iter()
        .map(|row| {
            positive(row.box_fb)?;
            let share = boxes.get(&box_key(row))?;
            let box_cost = cost * share.weight / total_weight;
            let row_cost = match positive(Some(row.units)) {
                Some(units) if share.units > Decimal::ZERO => box_cost * units / share.units,
                _ => box_cost / Decimal::from(share.members),
            };
            Some(round2(row_cost))
        })
        .collect()
}
