// ==========================================
// 花卉供货导入 - 规格合并键
// ==========================================
// 职责: (slug, 有效长度) 合并键
// 使用方: Validator（文件内重复提示）与 Upserter（合并/查找规格）共用同一函数
// ==========================================

use serde::{Deserialize, Serialize};

// 文本等级 → 有效长度（cm），精确匹配优先，其次按包含匹配（长词在前）
const GRADE_LENGTHS: &[(&str, i64)] = &[
    ("xxl", 120),
    ("xl", 100),
    ("jumbo", 80),
    ("premium", 60),
    ("select", 50),
    ("standard", 40),
    ("mini", 10),
];

/// 未映射等级的有效长度
pub const UNMAPPED_GRADE_LENGTH: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    pub slug: String,
    pub effective_length: i64,
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.slug, self.effective_length)
    }
}

/// 有效长度: 有长度取长度，否则按等级查表
pub fn effective_length(length: Option<i64>, grade: Option<&str>) -> i64 {
    if let Some(length) = length {
        return length;
    }
    let Some(grade) = grade else {
        return UNMAPPED_GRADE_LENGTH;
    };
    let lower = grade.trim().to_lowercase();

    if let Some((_, len)) = GRADE_LENGTHS.iter().find(|(token, _)| *token == lower) {
        return *len;
    }
    GRADE_LENGTHS
        .iter()
        .find(|(token, _)| lower.contains(token))
        .map(|(_, len)| *len)
        .unwrap_or(UNMAPPED_GRADE_LENGTH)
}

/// 合并键
pub fn variant_key(slug: &str, length: Option<i64>, grade: Option<&str>) -> VariantKey {
    VariantKey {
        slug: slug.to_string(),
        effective_length: effective_length(length, grade),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_length() {
        assert_eq!(effective_length(Some(60), Some("Jumbo")), 60);
        assert_eq!(effective_length(None, Some("Jumbo")), 80);
        assert_eq!(effective_length(None, Some("XXL")), 120);
        assert_eq!(effective_length(None, Some("Select XL")), 100);
        assert_eq!(effective_length(None, Some("mini")), 10);
        assert_eq!(effective_length(None, Some("Extra")), 0);
        assert_eq!(effective_length(None, None), 0);
    }

    #[test]
    fn test_variant_key_equality() {
        assert_eq!(variant_key("freedom", Some(80), None), variant_key("freedom", None, Some("Jumbo")));
        assert_ne!(variant_key("freedom", Some(60), None), variant_key("explorer", Some(60), None));
        assert_eq!(variant_key("freedom", Some(60), None).to_string(), "freedom@60");
    }
}
