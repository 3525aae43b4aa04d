// ==========================================
// 花卉供货导入 - 归一化器
// ==========================================
// 职责: ParsedRow → NormalizedRow
// - 名称规范化（同义词表 + 后缀剥离 + 标题大小写）
// - slug 生成（西里尔/变音字母转写）
// - 等级/长度拆分
// - 库存取整、单价保留 2 位
// 红线: 无状态；所有变更以警告形式报告，不抛错
// ==========================================

use crate::domain::sheet::ParsedRow;
use crate::domain::supply::{NormalizedRow, RowWarning};
use crate::engine::pricing::round2;
use crate::importer::checksum::{compute_row_hash, RowHashFields};
use crate::importer::synonyms::SynonymTable;
use std::sync::Arc;

/// 可剥离的花类后缀（按顺序尝试，长者在前）
const REMOVABLE_SUFFIXES: &[&str] = &[
    " spray rose",
    " garden rose",
    " rose",
    " spray",
    " garden",
    " sp",
    " r",
];

/// 文本等级关键字
pub const GRADE_TOKENS: &[&str] = &["mini", "standard", "select", "premium", "jumbo", "xl", "xxl"];

/// 合法长度范围（cm）
pub const MIN_LENGTH: i64 = 1;
pub const MAX_LENGTH: i64 = 500;

// ==========================================
// Normalizer
// ==========================================
pub struct Normalizer {
    synonyms: Arc<SynonymTable>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Arc::new(SynonymTable::default()))
    }
}

impl Normalizer {
    pub fn new(synonyms: Arc<SynonymTable>) -> Self {
        Self { synonyms }
    }

    /// 批量归一化
    pub fn normalize(&self, rows: &[ParsedRow]) -> (Vec<NormalizedRow>, Vec<RowWarning>) {
        let mut warnings = Vec::new();
        let normalized = rows
            .iter()
            .map(|row| self.normalize_row(row, &mut warnings))
            .collect();
        (normalized, warnings)
    }

    fn normalize_row(&self, row: &ParsedRow, warnings: &mut Vec<RowWarning>) -> NormalizedRow {
        let n = row.row_number;

        // 名称
        let naive = collapse_whitespace(&format!(
            "{} {}",
            row.variety,
            row.flower_type.as_deref().unwrap_or("")
        ));
        let flower_name = self.canonical_name(&naive);
        if flower_name != naive {
            warnings.push(
                RowWarning::new(n, "name", "名称已规范化").with_values(&naive, &flower_name),
            );
        }
        let slug = slugify(&flower_name);

        // 等级/长度
        let (length, grade) = split_grade(&row.grade, n, warnings);

        // 库存
        let rounded = row.units.round().max(0.0);
        if rounded != row.units {
            warnings.push(
                RowWarning::new(n, "stock", "数量已取整为非负整数").with_values(row.units, rounded),
            );
        }
        let stock = rounded as i64;

        // 单价
        let price = round2(row.unit_price.abs());
        if price != row.unit_price {
            warnings.push(
                RowWarning::new(n, "price", "单价已保留两位小数").with_values(row.unit_price, price),
            );
        }

        let supplier = trimmed(row.supplier.as_deref());
        let awb = trimmed(row.awb.as_deref());

        let hash = compute_row_hash(&RowHashFields {
            name: &flower_name,
            length,
            grade: grade.as_deref(),
            stock,
            price,
            supplier: supplier.as_deref(),
            awb: awb.as_deref(),
        });

        NormalizedRow {
            row_number: n,
            flower_name,
            slug,
            length,
            grade,
            stock,
            price,
            supplier,
            awb,
            hash,
            original: row.clone(),
        }
    }

    /// 名称规范化: 直查 → 剥离后缀再查 → 标题大小写
    pub fn canonical_name(&self, raw: &str) -> String {
        let display = collapse_whitespace(raw);
        let key = display.to_lowercase();

        if let Some(canonical) = self.synonyms.lookup(&key) {
            return canonical.to_string();
        }

        for suffix in REMOVABLE_SUFFIXES {
            if let Some(base) = strip_suffix_ignore_case(&display, suffix) {
                let base = base.trim();
                if base.is_empty() {
                    continue;
                }
                return match self.synonyms.lookup(&base.to_lowercase()) {
                    Some(canonical) => canonical.to_string(),
                    None => title_case(base),
                };
            }
        }

        title_case(&display)
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let start = s.len().checked_sub(suffix.len())?;
    let tail = s.get(start..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        s.get(..start)
    } else {
        None
    }
}

/// 标题大小写；不超过 2 个字母的全大写词视为缩写保留
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let is_abbreviation = word.chars().count() <= 2
                && word.chars().all(char::is_alphabetic)
                && word.chars().all(char::is_uppercase);
            if is_abbreviation {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 等级/长度拆分
///
/// - 含文本等级关键字（子串匹配，"Jumbo70" 也算）: (None, Some(标题化等级))
/// - 首段数字在 [1, 500]: (Some(长度), None)
/// - 数字越界: 降级为文本等级并警告
/// - 无数字: 原文作为等级（非空时警告）
pub fn split_grade(
    raw: &str,
    row: usize,
    warnings: &mut Vec<RowWarning>,
) -> (Option<i64>, Option<String>) {
    let text = raw.trim();
    let lower = text.to_lowercase();

    let has_grade_token = GRADE_TOKENS.iter().any(|token| lower.contains(token));
    if has_grade_token {
        return (None, Some(title_case(text)));
    }

    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();

    if digits.is_empty() {
        if text.is_empty() {
            return (None, None);
        }
        warnings.push(
            RowWarning::new(row, "grade", "未识别长度，按文本等级处理").with_values(text, text),
        );
        return (None, Some(text.to_string()));
    }

    match digits.parse::<i64>() {
        Ok(length) if (MIN_LENGTH..=MAX_LENGTH).contains(&length) => (Some(length), None),
        _ => {
            warnings.push(
                RowWarning::new(
                    row,
                    "length",
                    format!("长度超出 [{}, {}] cm，按文本等级处理", MIN_LENGTH, MAX_LENGTH),
                )
                .with_values(text, text),
            );
            (None, Some(text.to_string()))
        }
    }
}

/// slug: 转写后小写，非字母数字折叠为单个连字符
pub fn slugify(name: &str) -> String {
    let mut transliterated = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match transliterate(c) {
            Some(ascii) => transliterated.push_str(ascii),
            None if c.is_ascii_alphanumeric() => transliterated.push(c),
            None => transliterated.push('-'),
        }
    }

    transliterated
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn transliterate(c: char) -> Option<&'static str> {
    let ascii = match c {
        // 西里尔（乌克兰语 + 俄语）
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "h",
        'ґ' => "g",
        'д' => "d",
        'е' => "e",
        'є' => "ie",
        'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "y",
        'і' => "i",
        'ї' => "i",
        'й' => "i",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' | '\'' | '’' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "iu",
        'я' => "ia",
        // 拉丁变音
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => "a",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' => "o",
        'ú' | 'ù' | 'û' | 'ü' => "u",
        'ñ' => "n",
        'ç' => "c",
        'ß' => "ss",
        _ => return None,
    };
    Some(ascii)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn split(raw: &str) -> ((Option<i64>, Option<String>), usize) {
        let mut warnings = Vec::new();
        let result = split_grade(raw, 2, &mut warnings);
        (result, warnings.len())
    }

    #[test]
    fn test_split_grade_variants() {
        assert_eq!(split("90cm"), ((Some(90), None), 0));
        assert_eq!(split("jumbo"), ((None, Some("Jumbo".to_string())), 0));
        assert_eq!(split("900"), ((None, Some("900".to_string())), 1));
        assert_eq!(split(""), ((None, None), 0));
        assert_eq!(split("Extra"), ((None, Some("Extra".to_string())), 1));
        assert_eq!(split("XL"), ((None, Some("XL".to_string())), 0));
        assert_eq!(split("Jumbo70"), ((None, Some("Jumbo70".to_string())), 0));
        assert_eq!(split("70 select"), ((None, Some("70 Select".to_string())), 0));
    }

    #[test]
    fn test_canonical_name() {
        let normalizer = Normalizer::default();

        assert_eq!(normalizer.canonical_name("Freedom Rose"), "Freedom");
        assert_eq!(normalizer.canonical_name("  троянда "), "Rose");
        assert_eq!(normalizer.canonical_name("PINK FLOID"), "Pink Floyd");
        assert_eq!(normalizer.canonical_name("bubbles spray rose"), "Bubbles");
        assert_eq!(normalizer.canonical_name("sweet avalanche"), "Sweet Avalanche");
        assert_eq!(normalizer.canonical_name("moon NY"), "Moon NY");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Pink Floyd"), "pink-floyd");
        assert_eq!(slugify("Троянда Фрідом"), "troianda-fridom");
        assert_eq!(slugify("Señorita  (Mini)"), "senorita-mini");
        assert_eq!(slugify("Avalanche+"), "avalanche");
    }

    #[test]
    fn test_normalize_row_rounding_and_hash() {
        let row = ParsedRow::new(3, "freedom", "60 cm", 99.6, dec("-0.456")).with_supplier(" Alexandra ");

        let (rows, warnings) = Normalizer::default().normalize(&[row]);

        let normalized = &rows[0];
        assert_eq!(normalized.flower_name, "Freedom");
        assert_eq!(normalized.slug, "freedom");
        assert_eq!(normalized.length, Some(60));
        assert_eq!(normalized.stock, 100);
        assert_eq!(normalized.price, dec("0.46"));
        assert_eq!(normalized.supplier.as_deref(), Some("Alexandra"));
        assert_eq!(normalized.hash.len(), 16);

        let fields: Vec<&str> = warnings.iter().map(|w| w.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "stock", "price"]);
    }

    #[test]
    fn test_half_cent_price_rounds_up() {
        let (rows, warnings) =
            Normalizer::default().normalize(&[ParsedRow::new(2, "Freedom", "60", 10.0, dec("1.005"))]);

        assert_eq!(rows[0].price, dec("1.01"));
        assert_eq!(warnings[0].field, "price");
        assert_eq!(warnings[0].original_value.as_deref(), Some("1.005"));
        assert_eq!(warnings[0].normalized_value.as_deref(), Some("1.01"));
    }

    #[test]
    fn test_identical_rows_share_hash() {
        let a = ParsedRow::new(2, "Freedom", "60", 100.0, dec("0.45"));
        let b = ParsedRow::new(5, "FREEDOM ", "60cm", 100.0, dec("0.450"));

        let (rows, _) = Normalizer::default().normalize(&[a, b]);

        assert_eq!(rows[0].hash, rows[1].hash);
    }
}
