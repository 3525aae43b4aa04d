// ==========================================
// 花卉供货导入 - 表格领域模型
// ==========================================
// 职责: 单元格封闭类型 / 解析行 / 版式识别结果
// 生命周期: 仅在单次导入流程内
// ==========================================

use crate::domain::types::SheetFormat;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// Cell - 单元格
// ==========================================
// 表格中只会出现这四种值，下游按标签匹配，不做运行时类型探测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    Empty,
}

impl Cell {
    /// 空单元格或仅含空白的文本
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 去除首尾空白后的文本表示（空单元格返回空串）
    pub fn text(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Date(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.date().format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            Cell::Empty => String::new(),
        }
    }

    /// 小写文本，用于关键字匹配
    pub fn lower_text(&self) -> String {
        self.text().to_lowercase()
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(dt) => Some(dt.date()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

// 整数值不带小数点输出（"25" 而不是 "25.0"）
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// 原始表格：行 × 列，坐标与源文件一致
pub type Sheet = Vec<Vec<Cell>>;

/// 取单元格（越界视为空）
pub fn cell_at(row: &[Cell], col: usize) -> &Cell {
    static EMPTY: Cell = Cell::Empty;
    row.get(col).unwrap_or(&EMPTY)
}

// ==========================================
// ColumnMapping - 列映射
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub variety: Option<usize>,     // 品种
    pub flower_type: Option<usize>, // 花类（作物）
    pub grade: Option<usize>,       // 等级/长度
    pub units: Option<usize>,       // 数量（枝）
    pub price: Option<usize>,       // 单价
    pub total: Option<usize>,       // 金额
    pub supplier: Option<usize>,    // 供应商/农场
    pub awb: Option<usize>,         // 空运单号
    pub recipient: Option<usize>,   // 收货标记
    pub box_code: Option<usize>,    // 箱型代码（HB/QB/FB）
    pub box_fb: Option<usize>,      // 折算整箱数
}

impl ColumnMapping {
    /// 通用表头识别的最低要求: 品种 + 数量 + 单价
    pub fn has_core_columns(&self) -> bool {
        self.variety.is_some() && self.units.is_some() && self.price.is_some()
    }
}

// ==========================================
// FileMetadata - 文件级元数据
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub ship_date: Option<NaiveDate>,    // 发货日期
    pub awb: Option<String>,             // 空运单号
    pub document_id: Option<String>,     // 发票号
    pub transport_cost: Option<Decimal>, // 运费附加
    pub total_boxes: Option<f64>,        // 总箱数
}

// ==========================================
// FormatDetectionResult - 版式识别结果
// ==========================================
// 约束: 有表头时 data_start_row > header_row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDetectionResult {
    pub format: SheetFormat,
    pub columns: ColumnMapping,
    pub header_row: Option<usize>,
    pub data_start_row: usize,
    pub metadata: FileMetadata,
}

// ==========================================
// ParsedRow - 解析行
// ==========================================
// 用途: 解析器产出，归一化器消费
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub row_number: usize,               // 源文件行号（从 1 开始）
    pub variety: String,                 // 品种文本
    pub flower_type: Option<String>,     // 花类文本
    pub grade: String,                   // 等级/长度原始文本
    pub units: f64,                      // 数量
    pub unit_price: Decimal,             // 单价
    pub total: Option<Decimal>,          // 金额
    pub supplier: Option<String>,
    pub awb: Option<String>,
    pub recipient: Option<String>,
    pub qb_code: Option<String>,         // 箱型代码
    pub box_fb: Option<f64>,             // 所在箱的折算整箱数（运费分摊用）
    pub box_number: Option<usize>,       // 所在箱序号（从 1 开始），同箱各行相同
    pub original: BTreeMap<String, Cell>, // 原始单元格
}

impl ParsedRow {
    /// 测试/手工构造的最小行
    pub fn new(row_number: usize, variety: &str, grade: &str, units: f64, unit_price: Decimal) -> Self {
        Self {
            row_number,
            variety: variety.to_string(),
            flower_type: None,
            grade: grade.to_string(),
            units,
            unit_price,
            total: None,
            supplier: None,
            awb: None,
            recipient: None,
            qb_code: None,
            box_fb: None,
            box_number: None,
            original: BTreeMap::new(),
        }
    }

    pub fn with_supplier(mut self, supplier: &str) -> Self {
        self.supplier = Some(supplier.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(Cell::Number(25.0).text(), "25");
        assert_eq!(Cell::Number(1.25).text(), "1.25");
        assert_eq!(Cell::Text("  Rose ".to_string()).text(), "Rose");
        assert!(Cell::Text("   ".to_string()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());

        let dt = NaiveDate::from_ymd_opt(2024, 3, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Cell::Date(dt).text(), "2024-03-08");
    }

    #[test]
    fn test_cell_at_out_of_range() {
        let row = vec![Cell::Text("a".to_string())];
        assert_eq!(cell_at(&row, 5), &Cell::Empty);
    }
}
