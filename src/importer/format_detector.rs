// ==========================================
// 花卉供货导入 - 版式识别
// ==========================================
// 职责: 按优先级依次尝试版式策略，首个命中者生效
// 顺序: 版式 A（表头关键字） → 版式 B（首行元数据） → 通用表头 → 固定 4 列
// 扩展: 新版式只需新增 FormatStrategy 实现并加入列表
// ==========================================

use crate::domain::sheet::{cell_at, Cell, ColumnMapping, FileMetadata, FormatDetectionResult, Sheet};
use crate::domain::types::SheetFormat;
use crate::importer::cell_parser::{cell_date, cell_decimal, cell_money, parse_date_text};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// 表头搜索范围（前 N 行）
pub const HEADER_SCAN_ROWS: usize = 10;

// ==========================================
// 关键字表
// ==========================================

// 版式 A 必须同时出现的表头概念（每组任一同义词即可）
const LAYOUT_A_REQUIRED: &[&[&str]] = &[
    &["crop", "культура", "cultivo"],
    &["variety", "сорт", "variedad"],
    &["grade", "ростовка", "довжина", "длина", "grado"],
    &["stems", "стебл", "tallos"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Awb,
    Supplier,
    Recipient,
    Total,
    Price,
    Units,
    BoxFb,
    BoxCode,
    Grade,
    FlowerType,
    Variety,
}

// 同一列按此顺序匹配，先命中者生效
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Awb, &["awb", "air waybill", "авіанакладна", "авианакладная"]),
    (
        Category::Supplier,
        &["supplier", "farm", "grower", "постачальник", "поставщик", "ферма", "finca"],
    ),
    (
        Category::Recipient,
        &["recipient", "consignee", "client", "mark", "отримувач", "получатель", "маркування", "маркировка"],
    ),
    (Category::Total, &["total", "amount", "сума", "сумма", "importe"]),
    (Category::Price, &["price", "ціна", "цена", "precio", "€"]),
    (
        Category::Units,
        &["stems", "units", "qty", "quantity", "pcs", "кількість", "количество", "стебл", "шт", "tallos"],
    ),
    (Category::BoxFb, &["fb", "fbe", "full box"]),
    (Category::BoxCode, &["box", "коробка", "тип коробки", "caja"]),
    (
        Category::Grade,
        &["grade", "length", "size", "cm", "ростовка", "довжина", "длина", "grado"],
    ),
    (Category::FlowerType, &["crop", "type", "тип", "культура", "вид", "cultivo"]),
    (
        Category::Variety,
        &["variety", "сорт", "name", "назва", "название", "description", "product", "variedad"],
    ),
];

// 版式 B 首行判定
const PRICE_TOKENS: &[&str] = &["price", "ціна", "цена", "precio"];
const TOTAL_OR_AWB_TOKENS: &[&str] = &["total", "сума", "сумма", "awb"];

// 元数据地标
const DATE_LANDMARKS: &[&str] = &["date", "дата", "fecha"];
const TRANSPORT_LANDMARKS: &[&str] = &["transport", "freight", "доставка", "транспорт", "flete"];
const BOXES_LANDMARKS: &[&str] = &["total boxes", "boxes", "коробок", "cajas"];

static AWB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)awb\s*(?:no\.?|№|#)?\s*:?\s*(\d{3}[-\s]?\d{4}\s?\d{4})").expect("AWB 正则非法")
});

static AWB_BARE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3}-\d{4}\s?\d{4})\b").expect("AWB 正则非法"));

static DOCUMENT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:invoice|inv|рахунок|сч[её]т|factura)\s*(?:no\.?|nr\.?|№|#)?\s*:?\s*(\d[0-9A-Za-z/-]*)")
        .expect("发票号正则非法")
});

/// 关键字匹配: 不超过 3 个字符的关键字按整词比较，其余按子串
fn keyword_matches(cell_lower: &str, keyword: &str) -> bool {
    if keyword.chars().count() <= 3 && keyword.chars().all(char::is_alphanumeric) {
        cell_lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token == keyword)
    } else {
        cell_lower.contains(keyword)
    }
}

fn contains_any(cell_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| keyword_matches(cell_lower, k))
}

fn row_text(row: &[Cell]) -> String {
    row.iter()
        .filter(|c| !c.is_blank())
        .map(Cell::text)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// 按类别关键字构建列映射（每列取首个命中类别，每个类别取首个命中列）
pub fn map_header_columns(header: &[Cell]) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();

    for (col, cell) in header.iter().enumerate() {
        if cell.is_blank() {
            continue;
        }
        let lower = cell.lower_text();
        let Some(category) = CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| contains_any(&lower, keywords))
            .map(|(category, _)| *category)
        else {
            continue;
        };

        let slot = match category {
            Category::Awb => &mut mapping.awb,
            Category::Supplier => &mut mapping.supplier,
            Category::Recipient => &mut mapping.recipient,
            Category::Total => &mut mapping.total,
            Category::Price => &mut mapping.price,
            Category::Units => &mut mapping.units,
            Category::BoxFb => &mut mapping.box_fb,
            Category::BoxCode => &mut mapping.box_code,
            Category::Grade => &mut mapping.grade,
            Category::FlowerType => &mut mapping.flower_type,
            Category::Variety => &mut mapping.variety,
        };
        if slot.is_none() {
            *slot = Some(col);
        }
    }

    mapping
}

/// 地标右侧的值：同一单元格冒号之后，否则同一行后续第一个非空单元格
fn landmark_value(row: &[Cell], col: usize) -> Vec<Cell> {
    let mut values = Vec::new();
    if let Cell::Text(s) = cell_at(row, col) {
        if let Some((_, tail)) = s.split_once(':') {
            if !tail.trim().is_empty() {
                values.push(Cell::Text(tail.trim().to_string()));
            }
        }
    }
    values.extend(row.iter().skip(col + 1).filter(|c| !c.is_blank()).cloned());
    values
}

/// 扫描地标提取文件级元数据（发货日期 / 运费 / 总箱数 / AWB / 发票号）
pub fn extract_landmark_metadata(sheet: &Sheet, skip_row: Option<usize>) -> FileMetadata {
    let mut metadata = FileMetadata::default();

    for (idx, row) in sheet.iter().enumerate() {
        if Some(idx) == skip_row {
            continue;
        }
        for (col, cell) in row.iter().enumerate() {
            let Cell::Text(_) = cell else { continue };
            let lower = cell.lower_text();

            if metadata.ship_date.is_none() && contains_any(&lower, DATE_LANDMARKS) {
                metadata.ship_date = landmark_value(row, col).iter().find_map(cell_date);
            }
            if metadata.transport_cost.is_none() && contains_any(&lower, TRANSPORT_LANDMARKS) {
                metadata.transport_cost = landmark_value(row, col).iter().find_map(cell_money);
            }
            if metadata.total_boxes.is_none() && contains_any(&lower, BOXES_LANDMARKS) {
                metadata.total_boxes = landmark_value(row, col).iter().find_map(cell_decimal);
            }
        }
        if metadata.awb.is_none() || metadata.document_id.is_none() {
            let text = row_text(row);
            if metadata.awb.is_none() {
                metadata.awb = find_awb(&text);
            }
            if metadata.document_id.is_none() {
                metadata.document_id = DOCUMENT_ID_RE.captures(&text).map(|caps| caps[1].to_string());
            }
        }
    }

    metadata
}

fn find_awb(text: &str) -> Option<String> {
    AWB_RE
        .captures(text)
        .or_else(|| AWB_BARE_RE.captures(text))
        .map(|caps| caps[1].trim().to_string())
}

// ==========================================
// FormatStrategy - 版式策略
// ==========================================
pub trait FormatStrategy: Send + Sync {
    fn format(&self) -> SheetFormat;

    /// 命中返回识别结果，否则 None
    fn detect(&self, sheet: &Sheet) -> Option<FormatDetectionResult>;
}

// ==========================================
// 版式 A: 表头关键字
// ==========================================
pub struct HeaderKeywordStrategy;

impl HeaderKeywordStrategy {
    fn is_header(row: &[Cell]) -> bool {
        let lowered: Vec<String> = row
            .iter()
            .filter(|c| !c.is_blank())
            .map(Cell::lower_text)
            .collect();
        LAYOUT_A_REQUIRED
            .iter()
            .all(|group| lowered.iter().any(|cell| contains_any(cell, group)))
    }
}

impl FormatStrategy for HeaderKeywordStrategy {
    fn format(&self) -> SheetFormat {
        SheetFormat::HeaderKeyword
    }

    fn detect(&self, sheet: &Sheet) -> Option<FormatDetectionResult> {
        let header_row = sheet
            .iter()
            .take(HEADER_SCAN_ROWS)
            .position(|row| Self::is_header(row))?;

        Some(FormatDetectionResult {
            format: self.format(),
            columns: map_header_columns(&sheet[header_row]),
            header_row: Some(header_row),
            data_start_row: header_row + 1,
            metadata: extract_landmark_metadata(sheet, Some(header_row)),
        })
    }
}

// ==========================================
// 版式 B: 首行元数据 + 固定 10 列（无表头）
// ==========================================
// 列: 农场 | 箱型 | 折算整箱 | 品种 | 花类 | 等级 | 标记 | 枝数 | 单价 | 金额
pub struct MetadataFirstStrategy;

impl MetadataFirstStrategy {
    pub fn fixed_columns() -> ColumnMapping {
        ColumnMapping {
            supplier: Some(0),
            box_code: Some(1),
            box_fb: Some(2),
            variety: Some(3),
            flower_type: Some(4),
            grade: Some(5),
            recipient: Some(6),
            units: Some(7),
            price: Some(8),
            total: Some(9),
            awb: None,
        }
    }
}

impl FormatStrategy for MetadataFirstStrategy {
    fn format(&self) -> SheetFormat {
        SheetFormat::MetadataFirst
    }

    fn detect(&self, sheet: &Sheet) -> Option<FormatDetectionResult> {
        let first = sheet.first()?;
        let lowered: Vec<String> = first
            .iter()
            .filter(|c| !c.is_blank())
            .map(Cell::lower_text)
            .collect();

        let has_price = lowered.iter().any(|c| contains_any(c, PRICE_TOKENS));
        let has_total_or_awb = lowered.iter().any(|c| contains_any(c, TOTAL_OR_AWB_TOKENS));
        // 普通表头（品种/数量/单价齐全）交给通用策略
        if !has_price || !has_total_or_awb || map_header_columns(first).has_core_columns() {
            return None;
        }

        let text = row_text(first);
        let metadata = FileMetadata {
            ship_date: first
                .iter()
                .find_map(Cell::as_date)
                .or_else(|| parse_date_text(&text)),
            awb: find_awb(&text),
            document_id: DOCUMENT_ID_RE.captures(&text).map(|caps| caps[1].to_string()),
            transport_cost: None,
            total_boxes: None,
        };

        Some(FormatDetectionResult {
            format: self.format(),
            columns: Self::fixed_columns(),
            header_row: None,
            data_start_row: 1,
            metadata,
        })
    }
}

// ==========================================
// 通用表头
// ==========================================
pub struct GenericHeaderStrategy;

impl FormatStrategy for GenericHeaderStrategy {
    fn format(&self) -> SheetFormat {
        SheetFormat::GenericHeader
    }

    fn detect(&self, sheet: &Sheet) -> Option<FormatDetectionResult> {
        let (header_row, columns) = sheet
            .iter()
            .take(HEADER_SCAN_ROWS)
            .enumerate()
            .map(|(idx, row)| (idx, map_header_columns(row)))
            .find(|(_, mapping)| mapping.has_core_columns())?;

        Some(FormatDetectionResult {
            format: self.format(),
            columns,
            header_row: Some(header_row),
            data_start_row: header_row + 1,
            metadata: extract_landmark_metadata(sheet, Some(header_row)),
        })
    }
}

// ==========================================
// FormatDetector - 版式识别器
// ==========================================
pub struct FormatDetector {
    strategies: Vec<Box<dyn FormatStrategy>>,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new(vec![
            Box::new(HeaderKeywordStrategy),
            Box::new(MetadataFirstStrategy),
            Box::new(GenericHeaderStrategy),
        ])
    }
}

impl FormatDetector {
    pub fn new(strategies: Vec<Box<dyn FormatStrategy>>) -> Self {
        Self { strategies }
    }

    /// 无表头时的固定映射: 品种 | 等级 | 数量 | 单价
    pub fn fallback_columns() -> ColumnMapping {
        ColumnMapping {
            variety: Some(0),
            grade: Some(1),
            units: Some(2),
            price: Some(3),
            ..ColumnMapping::default()
        }
    }

    pub fn detect(&self, sheet: &Sheet) -> FormatDetectionResult {
        for strategy in &self.strategies {
            if let Some(result) = strategy.detect(sheet) {
                debug!(format = %result.format, header_row = ?result.header_row, "版式识别命中");
                return result;
            }
        }

        debug!("未识别版式，使用固定 4 列映射");
        FormatDetectionResult {
            format: SheetFormat::Unknown,
            columns: Self::fallback_columns(),
            header_row: None,
            data_start_row: 0,
            metadata: FileMetadata::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells
            .iter()
            .map(|c| {
                if c.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(c.to_string())
                }
            })
            .collect()
    }

    #[test]
    fn test_header_keyword_layout() {
        let sheet = vec![
            text_row(&["Date: 12.03.2024", "", "", ""]),
            text_row(&["Farm", "Crop", "Variety", "Grade", "Stems", "Price", "Total"]),
            text_row(&["Alexandra", "Rose", "Freedom", "60", "300", "0,45", "135"]),
            text_row(&["Transport", "", "", "", "", "", "42,50"]),
            text_row(&["Total boxes", "3"]),
        ];

        let result = FormatDetector::default().detect(&sheet);

        assert_eq!(result.format, SheetFormat::HeaderKeyword);
        assert_eq!(result.header_row, Some(1));
        assert_eq!(result.data_start_row, 2);
        assert_eq!(result.columns.supplier, Some(0));
        assert_eq!(result.columns.flower_type, Some(1));
        assert_eq!(result.columns.variety, Some(2));
        assert_eq!(result.columns.grade, Some(3));
        assert_eq!(result.columns.units, Some(4));
        assert_eq!(result.columns.price, Some(5));
        assert_eq!(result.columns.total, Some(6));
        assert_eq!(result.metadata.ship_date, chrono::NaiveDate::from_ymd_opt(2024, 3, 12));
        assert_eq!(result.metadata.transport_cost, Some(rust_decimal::Decimal::new(425, 1)));
        assert_eq!(result.metadata.total_boxes, Some(3.0));
    }

    #[test]
    fn test_metadata_first_layout() {
        let sheet = vec![
            text_row(&["Invoice No 2024-117", "AWB 369-1234 5678", "12.03.2024", "Price", "Total"]),
            text_row(&["Alexandra", "HB", "0.5", "Freedom", "Rose", "60", "KV", "300", "0.45", "135"]),
        ];

        let result = FormatDetector::default().detect(&sheet);

        assert_eq!(result.format, SheetFormat::MetadataFirst);
        assert_eq!(result.header_row, None);
        assert_eq!(result.data_start_row, 1);
        assert_eq!(result.columns, MetadataFirstStrategy::fixed_columns());
        assert_eq!(result.metadata.document_id.as_deref(), Some("2024-117"));
        assert_eq!(result.metadata.awb.as_deref(), Some("369-1234 5678"));
        assert_eq!(result.metadata.ship_date, chrono::NaiveDate::from_ymd_opt(2024, 3, 12));
    }

    #[test]
    fn test_generic_header_below_title() {
        let sheet = vec![
            text_row(&["Supplier invoice"]),
            text_row(&[""]),
            text_row(&["Назва", "Довжина", "Кількість", "Ціна"]),
            text_row(&["Троянда Freedom", "60", "100", "0,45"]),
        ];

        let result = FormatDetector::default().detect(&sheet);

        assert_eq!(result.format, SheetFormat::GenericHeader);
        assert_eq!(result.header_row, Some(2));
        assert_eq!(result.data_start_row, 3);
        assert_eq!(result.columns.variety, Some(0));
        assert_eq!(result.columns.grade, Some(1));
        assert_eq!(result.columns.units, Some(2));
        assert_eq!(result.columns.price, Some(3));
    }

    #[test]
    fn test_plain_header_with_total_is_not_metadata_first() {
        let sheet = vec![
            text_row(&["Variety", "Length", "Stems", "Price", "Total"]),
            text_row(&["Freedom", "60", "100", "0.45", "45"]),
        ];

        let result = FormatDetector::default().detect(&sheet);
        assert_eq!(result.format, SheetFormat::GenericHeader);
    }

    #[test]
    fn test_unknown_falls_back_to_positional() {
        let sheet = vec![
            text_row(&["Freedom", "60", "100", "0.45"]),
            text_row(&["Explorer", "70", "50", "0.60"]),
        ];

        let result = FormatDetector::default().detect(&sheet);

        assert_eq!(result.format, SheetFormat::Unknown);
        assert_eq!(result.header_row, None);
        assert_eq!(result.data_start_row, 0);
        assert_eq!(result.columns, FormatDetector::fallback_columns());
    }

    #[test]
    fn test_short_keywords_match_whole_words() {
        assert!(keyword_matches("fb", "fb"));
        assert!(!keyword_matches("fbx total", "fb"));
        assert!(keyword_matches("length (cm)", "cm"));
        assert!(keyword_matches("price €", "€"));
    }
}
