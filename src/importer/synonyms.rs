// ==========================================
// 花卉供货导入 - 名称同义词表
// ==========================================
// 职责: 变体写法 → 规范名称
// 生命周期: 启动时构建一次，之后只读，注入 Normalizer
// ==========================================

use std::collections::HashMap;

// 规范名称 → 常见变体写法（含乌克兰语/俄语/西班牙语）
const DEFAULT_DICTIONARY: &[(&str, &[&str])] = &[
    // 花类
    ("Rose", &["roses", "троянда", "троянди", "роза", "розы", "rosa"]),
    ("Spray Rose", &["rose spray", "spray roses", "кущова троянда", "кустовая роза", "rosa spray"]),
    ("Garden Rose", &["garden roses", "садова троянда", "садовая роза"]),
    ("Carnation", &["carnations", "dianthus", "гвоздика", "гвоздики", "clavel"]),
    ("Spray Carnation", &["mini carnation", "кущова гвоздика", "кустовая гвоздика", "miniclavel"]),
    ("Chrysanthemum", &["chrysant", "chrysanthemums", "хризантема", "хризантеми", "crisantemo", "pompon"]),
    ("Alstroemeria", &["alstro", "альстромерія", "альстромерия", "astromelia"]),
    ("Gypsophila", &["gyps", "gypso", "paniculata", "гіпсофіла", "гипсофила"]),
    ("Hydrangea", &["hydrangeas", "hortensia", "гортензія", "гортензия"]),
    ("Limonium", &["statice", "лімоніум", "лимониум"]),
    ("Eucalyptus", &["eucalipto", "евкаліпт", "эвкалипт"]),
    // 品种
    ("Freedom", &["freedom red", "фрідом", "фридом"]),
    ("Explorer", &["експлорер", "эксплорер"]),
    ("Mondial", &["мондіаль", "мондиаль"]),
    ("Vendela", &["венделла", "вендела"]),
    ("Playa Blanca", &["playa blanka", "плая бланка"]),
    ("Pink Floyd", &["pink floid", "пінк флойд", "пинк флойд"]),
    ("Red Naomi", &["naomi red", "ред наомі", "ред наоми"]),
    ("Avalanche", &["avalanche+", "аваланж", "аваланш"]),
    ("Deep Purple", &["дип перпл"]),
    ("Country Blues", &["кантрі блюз", "кантри блюз"]),
];

/// 名称同义词表（不可变）
#[derive(Debug, Clone)]
pub struct SynonymTable {
    index: HashMap<String, String>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::from_dictionary(DEFAULT_DICTIONARY.iter().map(|(canonical, variants)| {
            (canonical.to_string(), variants.iter().map(|v| v.to_string()).collect())
        }))
    }
}

impl SynonymTable {
    /// 由 规范名 → 变体列表 构建索引（规范名自身也入索引）
    pub fn from_dictionary<I>(dictionary: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut index = HashMap::new();
        for (canonical, variants) in dictionary {
            index.insert(canonical.trim().to_lowercase(), canonical.clone());
            for variant in variants {
                index.insert(variant.trim().to_lowercase(), canonical.clone());
            }
        }
        Self { index }
    }

    /// 查找规范名（输入需已小写并去空白）
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_maps_variants_and_canonical() {
        let table = SynonymTable::default();

        assert_eq!(table.lookup("троянда"), Some("Rose"));
        assert_eq!(table.lookup("rose"), Some("Rose"));
        assert_eq!(table.lookup("pink floid"), Some("Pink Floyd"));
        assert_eq!(table.lookup("unknown"), None);
    }

    #[test]
    fn test_custom_dictionary() {
        let table = SynonymTable::from_dictionary(vec![(
            "Ranunculus".to_string(),
            vec![" Ranunculo ".to_string()],
        )]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("ranunculo"), Some("Ranunculus"));
        assert_eq!(table.lookup("ranunculus"), Some("Ranunculus"));
    }
}
