// ==========================================
// 花卉供货导入 - 单元格数值/日期解析
// ==========================================
// 职责: 逗号/点小数歧义消解、整数千分位、文本日期
// ==========================================

use crate::domain::sheet::Cell;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

static DMY_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[./-](\d{1,2})[./-](\d{4}|\d{2})\b").expect("日期正则非法")
});

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("日期正则非法"));

/// 逗号/点歧义消解后的数字文本（"1.234,56" → "1234.56"）
///
/// # 规则
/// - 逗号与点同时出现: 最右侧者为小数点，另一个为千分位
/// - 只出现一种且仅一次: 视为小数点
/// - 只出现一种且多次: 视为千分位
fn normalize_number_text(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let negative = kept.starts_with('-');
    let kept: String = kept.chars().filter(|c| *c != '-').collect();

    let normalized = match (kept.rfind(','), kept.rfind('.')) {
        (Some(comma), Some(dot)) => {
            if comma > dot {
                kept.replace('.', "").replace(',', ".")
            } else {
                kept.replace(',', "")
            }
        }
        (Some(_), None) => single_separator(&kept, ','),
        (None, Some(_)) => single_separator(&kept, '.'),
        (None, None) => kept,
    };

    Some(if negative {
        format!("-{}", normalized)
    } else {
        normalized
    })
}

/// 解析小数（数量、折算整箱数等非金额值）
pub fn parse_decimal(raw: &str) -> Option<f64> {
    normalize_number_text(raw)?.parse::<f64>().ok()
}

/// 解析金额（按文本精确解析，不经过浮点）
pub fn parse_money(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&normalize_number_text(raw)?).ok()
}

/// f64 → Decimal
///
/// 取 f64 的最短十进制表示，Excel 中的 0.45 得到 0.45 而不是 0.450000000000000011...
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

fn single_separator(kept: &str, sep: char) -> String {
    if kept.matches(sep).count() == 1 {
        kept.replace(sep, ".")
    } else {
        kept.replace(sep, "")
    }
}

/// 解析整数（枝数等）
///
/// 只保留数字与分隔符；最后一个分隔符后恰好 3 位数字时按千分位处理，
/// 否则按小数解析（由调用方取整）
pub fn parse_integer(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    match kept.rfind([',', '.']) {
        Some(pos) if kept.len() - pos - 1 == 3 => kept
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse::<f64>()
            .ok(),
        Some(_) => parse_decimal(&kept),
        None => kept.parse::<f64>().ok(),
    }
}

/// 单元格 → 小数
pub fn cell_decimal(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => parse_decimal(s),
        _ => None,
    }
}

/// 单元格 → 金额
pub fn cell_money(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Number(n) => decimal_from_f64(*n),
        Cell::Text(s) => parse_money(s),
        _ => None,
    }
}

/// 单元格 → 整数语义的数值
pub fn cell_integer(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => parse_integer(s),
        _ => None,
    }
}

/// 文本中的第一个日期（dd.mm.yyyy / dd/mm/yy / yyyy-mm-dd）
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(text) {
        let y = caps[1].parse().ok()?;
        let m = caps[2].parse().ok()?;
        let d = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return Some(date);
        }
    }

    let caps = DMY_DATE.captures(text)?;
    let d = caps[1].parse().ok()?;
    let m = caps[2].parse().ok()?;
    let mut y: i32 = caps[3].parse().ok()?;
    if caps[3].len() == 2 {
        y += 2000;
    }
    NaiveDate::from_ymd_opt(y, m, d)
}

/// 单元格 → 日期
pub fn cell_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(_) => cell.as_date(),
        Cell::Text(s) => parse_date_text(s),
        _ => None,
    }
}
