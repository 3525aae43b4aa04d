// ==========================================
// 花卉供货导入 - 供货领域模型
// ==========================================
// 职责: 归一化行 / 行级错误与警告 / 供货记录 / 导入选项与结果
// 对齐: 供货记录 JSON 字段为 camelCase
// ==========================================

use crate::domain::sheet::{Cell, ParsedRow};
use crate::domain::types::{RowOutcome, SheetFormat, StockMode, SupplyStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// NormalizedRow - 归一化行
// ==========================================
// 约束: length 与 grade 只有一个参与规格身份
// 约束: hash 由 (name, length, grade, stock, price, supplier, awb) 决定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    pub row_number: usize,
    pub flower_name: String,
    pub slug: String,
    pub length: Option<i64>,     // 长度（cm）
    pub grade: Option<String>,   // 文本等级
    pub stock: i64,
    pub price: Decimal,          // 单位成本（EUR，2 位小数）
    pub supplier: Option<String>,
    pub awb: Option<String>,
    pub hash: String,            // 16 位行哈希
    pub original: ParsedRow,
}

impl NormalizedRow {
    pub fn snapshot(&self) -> NormalizedSnapshot {
        NormalizedSnapshot {
            flower_name: self.flower_name.clone(),
            length: self.length,
            grade: self.grade.clone(),
            stock: self.stock,
            price: self.price,
            supplier: self.supplier.clone(),
            awb: self.awb.clone(),
        }
    }
}

// ==========================================
// RowError / RowWarning - 行级问题
// ==========================================
// RowError 阻断该行入库；RowWarning 仅提示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row: usize,
    pub field: String,
    pub message: String,
    pub original_value: Option<String>,
    pub normalized_value: Option<String>,
}

impl RowError {
    pub fn new(row: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.to_string(),
            message: message.into(),
            original_value: None,
            normalized_value: None,
        }
    }

    /// 原始单元格文本 + 归一化后的值
    pub fn with_values(mut self, original: impl ToString, normalized: impl ToString) -> Self {
        self.original_value = Some(original.to_string());
        self.normalized_value = Some(normalized.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowWarning {
    pub row: usize,
    pub field: String,
    pub message: String,
    pub original_value: Option<String>,
    pub normalized_value: Option<String>,
}

impl RowWarning {
    pub fn new(row: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.to_string(),
            message: message.into(),
            original_value: None,
            normalized_value: None,
        }
    }

    pub fn with_values(mut self, original: impl ToString, normalized: impl ToString) -> Self {
        self.original_value = Some(original.to_string());
        self.normalized_value = Some(normalized.to_string());
        self
    }
}

// ==========================================
// 供货记录（审计日志，只追加）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSnapshot {
    pub flower_name: String,
    pub length: Option<i64>,
    pub grade: Option<String>,
    pub stock: i64,
    pub price: Decimal,
    pub supplier: Option<String>,
    pub awb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyRowEntry {
    pub row_number: usize,
    pub original: BTreeMap<String, Cell>,
    pub normalized: NormalizedSnapshot,
    pub hash: String,
    pub outcome: RowOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_share: Option<Decimal>, // 分摊运费
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyRecord {
    pub id: String,
    pub filename: String,
    pub checksum: String,              // 文件 SHA-256（hex）
    pub parsed_at: DateTime<Utc>,
    pub awb: Option<String>,
    pub supplier: Option<String>,
    pub document_id: Option<String>,
    pub ship_date: Option<NaiveDate>,
    pub transport_cost: Option<Decimal>,
    pub total_boxes: Option<f64>,
    pub format: SheetFormat,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub rows: Vec<SupplyRowEntry>,
    pub supply_status: SupplyStatus,
    pub supply_errors: Vec<RowError>,
    pub supply_warnings: Vec<RowWarning>,
    pub uploaded_by: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl SupplyRecord {
    pub fn summary(&self) -> SupplySummary {
        SupplySummary {
            id: self.id.clone(),
            filename: self.filename.clone(),
            checksum: self.checksum.clone(),
            parsed_at: self.parsed_at,
            supply_status: self.supply_status,
            total_rows: self.total_rows,
            valid_rows: self.valid_rows,
            published_at: self.published_at,
        }
    }
}

/// 供货记录摘要（查重/历史列表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplySummary {
    pub id: String,
    pub filename: String,
    pub checksum: String,
    pub parsed_at: DateTime<Utc>,
    pub supply_status: SupplyStatus,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub published_at: Option<DateTime<Utc>>,
}

// ==========================================
// ImportOptions - 导入选项
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub stock_mode: StockMode,
    pub force_import: bool,
    pub awb: Option<String>,       // 覆盖所有行的空运单号
    pub supplier: Option<String>,  // 覆盖所有行的供应商
    pub user_id: Option<String>,
}

// ==========================================
// 入库统计 / 导入结果
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCounts {
    pub flowers_created: usize,
    pub flowers_updated: usize,
    pub variants_created: usize,
    pub variants_updated: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub flowers_created: usize,
    pub flowers_updated: usize,
    pub variants_created: usize,
    pub variants_updated: usize,
}

impl ImportStats {
    pub fn new(total_rows: usize, valid_rows: usize, counts: UpsertCounts) -> Self {
        Self {
            total_rows,
            valid_rows,
            flowers_created: counts.flowers_created,
            flowers_updated: counts.flowers_updated,
            variants_created: counts.variants_created,
            variants_updated: counts.variants_updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub supply_id: String,
    pub status: SupplyStatus,
    pub stats: ImportStats,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
    pub rows: Vec<NormalizedRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_options_deserialize_defaults() {
        let options: ImportOptions =
            serde_json::from_str(r#"{"dryRun": true, "stockMode": "add"}"#).unwrap();
        assert!(options.dry_run);
        assert_eq!(options.stock_mode, StockMode::Add);
        assert!(!options.force_import);
        assert_eq!(options.awb, None);
    }

    #[test]
    fn test_row_entry_skips_empty_error() {
        let entry = SupplyRowEntry {
            row_number: 2,
            original: BTreeMap::new(),
            normalized: NormalizedSnapshot {
                flower_name: "Freedom".to_string(),
                length: Some(60),
                grade: None,
                stock: 100,
                price: Decimal::new(45, 2),
                supplier: None,
                awb: None,
            },
            hash: "0123456789abcdef".to_string(),
            outcome: RowOutcome::Created,
            error: None,
            transport_share: None,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["outcome"], "created");
        assert!(json.get("error").is_none());
        assert_eq!(json["normalized"]["flowerName"], "Freedom");
        assert_eq!(json["normalized"]["price"], "0.45");
    }
}
