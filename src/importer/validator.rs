// ==========================================
// 花卉供货导入 - 行级校验
// ==========================================
// 职责: 字段规则校验 + 文件内重复提示
// 规则: 每行独立校验，可累积多个错误；有错误的行不进入 valid
// 重复: 按合并键（slug + 有效长度）提示，首次出现者为准，不剔除
// ==========================================

use crate::domain::supply::{NormalizedRow, RowError, RowWarning};
use crate::importer::normalizer::{MAX_LENGTH, MIN_LENGTH};
use crate::importer::variant_key::{variant_key, VariantKey};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_STOCK: i64 = 1_000_000;
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
pub const MAX_PRICE: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// 校验产出
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub valid: Vec<NormalizedRow>,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
}

/// 单行规则校验
///
/// 错误携带原始单元格文本（original_value）与归一化值（normalized_value）
pub fn validate_row(row: &NormalizedRow) -> Vec<RowError> {
    let n = row.row_number;
    let raw = &row.original;
    let mut errors = Vec::new();

    let name_chars = row.flower_name.chars().count();
    if name_chars == 0 {
        errors.push(RowError::new(n, "name", "名称不能为空"));
    } else if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&name_chars) {
        errors.push(
            RowError::new(
                n,
                "name",
                format!("名称长度须在 {}..={} 个字符之间", MIN_NAME_CHARS, MAX_NAME_CHARS),
            )
            .with_values(&raw.variety, &row.flower_name),
        );
    }

    if row.slug.is_empty() {
        errors.push(RowError::new(n, "slug", "slug 不能为空").with_values(&raw.variety, &row.slug));
    }

    if let Some(length) = row.length {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            errors.push(
                RowError::new(n, "length", format!("长度须在 [{}, {}] cm", MIN_LENGTH, MAX_LENGTH))
                    .with_values(&raw.grade, length),
            );
        }
    }

    let has_grade = row.grade.as_deref().is_some_and(|g| !g.trim().is_empty());
    if row.length.is_none() && !has_grade {
        errors.push(RowError::new(n, "length", "length or grade required"));
    }

    if row.stock == 0 {
        errors.push(
            RowError::new(n, "stock", "stock must be greater than zero").with_values(raw.units, row.stock),
        );
    } else if !(0..=MAX_STOCK).contains(&row.stock) {
        errors.push(
            RowError::new(n, "stock", format!("库存须在 [0, {}]", MAX_STOCK))
                .with_values(raw.units, row.stock),
        );
    }

    if !(MIN_PRICE..=MAX_PRICE).contains(&row.price) {
        errors.push(
            RowError::new(n, "price", format!("单价须在 [{}, {}]", MIN_PRICE, MAX_PRICE))
                .with_values(raw.unit_price, row.price),
        );
    }

    errors
}

/// 批量校验
pub fn validate(rows: Vec<NormalizedRow>, warnings: Vec<RowWarning>) -> ValidationOutcome {
    let mut outcome = ValidationOutcome {
        warnings,
        ..ValidationOutcome::default()
    };

    for row in rows {
        let errors = validate_row(&row);
        if errors.is_empty() {
            outcome.valid.push(row);
        } else {
            debug!(row = row.row_number, errors = errors.len(), "行校验未通过");
            outcome.errors.extend(errors);
        }
    }

    // 第二遍: 文件内重复
    let mut first_seen: HashMap<VariantKey, usize> = HashMap::new();
    for row in &outcome.valid {
        let key = variant_key(&row.slug, row.length, row.grade.as_deref());
        match first_seen.get(&key) {
            Some(first_row) => outcome.warnings.push(
                RowWarning::new(
                    row.row_number,
                    "duplicate",
                    format!("与第 {} 行为同一规格，将合并入库", first_row),
                )
                .with_values(&row.flower_name, &key),
            ),
            None => {
                first_seen.insert(key, row.row_number);
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sheet::ParsedRow;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn row(n: usize, name: &str, length: Option<i64>, grade: Option<&str>, stock: i64, price: &str) -> NormalizedRow {
        let price = dec(price);
        NormalizedRow {
            row_number: n,
            flower_name: name.to_string(),
            slug: crate::importer::normalizer::slugify(name),
            length,
            grade: grade.map(str::to_string),
            stock,
            price,
            supplier: None,
            awb: None,
            hash: format!("{:016}", n),
            original: ParsedRow::new(n, name, &length.map(|l| l.to_string()).unwrap_or_default(), stock as f64, price),
        }
    }

    fn messages(r: &NormalizedRow) -> Vec<String> {
        validate_row(r).into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn test_price_boundaries() {
        assert!(messages(&row(2, "Freedom", Some(60), None, 10, "0.0"))[0].contains("单价"));
        assert_eq!(validate_row(&row(2, "Freedom", Some(60), None, 10, "100000.01")).len(), 1);
        assert!(validate_row(&row(2, "Freedom", Some(60), None, 10, "100000.0")).is_empty());
        assert!(validate_row(&row(2, "Freedom", Some(60), None, 10, "0.01")).is_empty());
    }

    #[test]
    fn test_stock_rules() {
        assert_eq!(
            messages(&row(2, "Freedom", Some(60), None, 0, "1.0")),
            vec!["stock must be greater than zero".to_string()]
        );
        assert_eq!(validate_row(&row(2, "Freedom", Some(60), None, -1, "1.0")).len(), 1);
        assert_eq!(validate_row(&row(2, "Freedom", Some(60), None, 1_000_001, "1.0")).len(), 1);
    }

    #[test]
    fn test_length_or_grade_required() {
        assert_eq!(
            messages(&row(2, "Freedom", None, None, 10, "1.0")),
            vec!["length or grade required".to_string()]
        );
        assert!(validate_row(&row(2, "Freedom", None, Some("Jumbo"), 10, "1.0")).is_empty());
    }

    #[test]
    fn test_errors_carry_original_and_normalized_values() {
        let mut r = row(7, "Freedom", Some(60), None, 10, "0.00");
        r.original.unit_price = dec("0.004");

        let errors = validate_row(&r);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].original_value.as_deref(), Some("0.004"));
        assert_eq!(errors[0].normalized_value.as_deref(), Some("0.00"));

        let errors = validate_row(&row(8, "Freedom", Some(900), None, 10, "1.00"));
        assert_eq!(errors[0].field, "length");
        assert_eq!(errors[0].original_value.as_deref(), Some("900"));
    }

    #[test]
    fn test_errors_accumulate() {
        let errors = validate_row(&row(4, "F", Some(600), None, -5, "0.0"));
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "length", "stock", "price"]);
    }

    #[test]
    fn test_duplicates_are_warned_not_removed() {
        let rows = vec![
            row(2, "Freedom", Some(60), None, 10, "1.0"),
            row(3, "Explorer", Some(60), None, 10, "1.0"),
            row(4, "Freedom", Some(60), None, 20, "2.0"),
            row(5, "Freedom", None, None, 20, "2.0"),
        ];

        let outcome = validate(rows, Vec::new());

        assert_eq!(outcome.valid.len(), 3);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].row, 4);
        assert!(outcome.warnings[0].message.contains('2'));
    }
}
