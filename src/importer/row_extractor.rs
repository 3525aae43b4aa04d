// ==========================================
// 花卉供货导入 - 行提取
// ==========================================
// 职责: 按列映射从数据区提取 ParsedRow
// 规则:
// - 跳过空行、小计/合计行
// - 续行（品种为空）沿用上一品种，仅限版式 A/B
// - 供应商、箱型、折算整箱数为"滚动上下文"，空单元格沿用上一值
// - 带折算整箱数的行开启新箱，后续沿用的行属于同一箱（box_number 相同）
// - 数量或单价非正的行丢弃
// ==========================================

use crate::domain::sheet::{cell_at, Cell, FormatDetectionResult, ParsedRow, Sheet};
use crate::importer::cell_parser::{cell_decimal, cell_integer, cell_money};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

// 合计行标志（整格相等）
const SUMMARY_TOKENS: &[&str] = &["total", "totals", "итого", "всього", "разом", "subtotal"];

// 箱型代码
const BOX_CODES: &[&str] = &["hb", "qb", "fb", "eb", "tb"];

/// 合计行: 某格恰为合计标志，或箱型代码与 "total" 字样同行
fn is_summary_row(row: &[Cell]) -> bool {
    let lowered: Vec<String> = row
        .iter()
        .filter(|c| !c.is_blank())
        .map(Cell::lower_text)
        .collect();

    if lowered.iter().any(|c| SUMMARY_TOKENS.contains(&c.as_str())) {
        return true;
    }

    let has_box_code = lowered.iter().any(|c| BOX_CODES.contains(&c.as_str()));
    let mentions_total = lowered.iter().any(|c| c.contains("total"));
    has_box_code && mentions_total
}

fn text_at(row: &[Cell], col: Option<usize>) -> Option<String> {
    let cell = cell_at(row, col?);
    if cell.is_blank() {
        None
    } else {
        Some(cell.text())
    }
}

fn value_at<T>(row: &[Cell], col: Option<usize>, parse: fn(&Cell) -> Option<T>) -> Option<T> {
    parse(cell_at(row, col?))
}

/// 原始单元格快照的键: 表头文本，无表头时为 col{列号}
fn original_keys(sheet: &Sheet, detection: &FormatDetectionResult) -> Vec<String> {
    let header = detection.header_row.and_then(|idx| sheet.get(idx));
    let width = sheet.iter().map(Vec::len).max().unwrap_or(0);

    let mut keys: Vec<String> = Vec::with_capacity(width);
    for col in 0..width {
        let candidate = header
            .map(|h| cell_at(h, col).text())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("col{}", col + 1));
        let key = if keys.contains(&candidate) {
            format!("{}_{}", candidate, col + 1)
        } else {
            candidate
        };
        keys.push(key);
    }
    keys
}

// 跨行沿用的上下文
#[derive(Default)]
struct RunningContext {
    supplier: Option<String>,
    box_code: Option<String>,
    box_fb: Option<f64>,
    box_count: usize,
    variety: Option<String>,
    flower_type: Option<String>,
}

/// 从数据区提取解析行
pub fn extract_rows(sheet: &Sheet, detection: &FormatDetectionResult) -> Vec<ParsedRow> {
    let columns = &detection.columns;
    let keys = original_keys(sheet, detection);
    let mut context = RunningContext::default();
    let mut rows = Vec::new();

    for (idx, row) in sheet.iter().enumerate().skip(detection.data_start_row) {
        let row_number = idx + 1;

        if row.iter().all(Cell::is_blank) {
            continue;
        }
        if is_summary_row(row) {
            debug!(row = row_number, "跳过合计行");
            continue;
        }

        if let Some(supplier) = text_at(row, columns.supplier) {
            context.supplier = Some(supplier);
        }
        if let Some(box_code) = text_at(row, columns.box_code) {
            context.box_code = Some(box_code);
        }
        if let Some(box_fb) = value_at(row, columns.box_fb, cell_decimal) {
            context.box_fb = Some(box_fb);
            context.box_count += 1;
        }

        let units = value_at(row, columns.units, cell_integer);
        let unit_price = value_at(row, columns.price, cell_money);

        let (variety, flower_type) = match text_at(row, columns.variety) {
            Some(variety) => {
                let flower_type = text_at(row, columns.flower_type);
                context.variety = Some(variety.clone());
                context.flower_type = flower_type.clone();
                (variety, flower_type)
            }
            None if detection.format.allows_continuation() => match &context.variety {
                Some(last) => (
                    last.clone(),
                    text_at(row, columns.flower_type).or_else(|| context.flower_type.clone()),
                ),
                None => {
                    debug!(row = row_number, "品种为空且无可沿用的上一行，跳过");
                    continue;
                }
            },
            None => {
                debug!(row = row_number, "品种为空，跳过");
                continue;
            }
        };

        let (Some(units), Some(unit_price)) = (units, unit_price) else {
            debug!(row = row_number, "缺少数量或单价，丢弃");
            continue;
        };
        if units <= 0.0 || unit_price <= Decimal::ZERO {
            debug!(row = row_number, units, unit_price = %unit_price, "数量或单价非正，丢弃");
            continue;
        }

        let original: BTreeMap<String, Cell> = row
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_blank())
            .map(|(col, cell)| {
                let key = keys
                    .get(col)
                    .cloned()
                    .unwrap_or_else(|| format!("col{}", col + 1));
                (key, cell.clone())
            })
            .collect();

        rows.push(ParsedRow {
            row_number,
            variety,
            flower_type,
            grade: text_at(row, columns.grade).unwrap_or_default(),
            units,
            unit_price,
            total: value_at(row, columns.total, cell_money),
            supplier: context.supplier.clone(),
            awb: text_at(row, columns.awb),
            recipient: text_at(row, columns.recipient),
            qb_code: context.box_code.clone(),
            box_fb: context.box_fb,
            box_number: context.box_fb.map(|_| context.box_count),
            original,
        });
    }

    rows
}
