// ==========================================
// 花卉供货导入 - 领域类型定义
// ==========================================
// 职责: 库存模式 / 行结果 / 供货状态 / 表格版式
// 序列化格式: 小写（与供货记录 JSON 一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 库存模式 (Stock Mode)
// ==========================================
// 已有规格再次导入时的库存合并策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockMode {
    #[default]
    Replace, // 以导入数量覆盖
    Add,     // 累加
    Skip,    // 保持原库存
}

impl fmt::Display for StockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockMode::Replace => write!(f, "replace"),
            StockMode::Add => write!(f, "add"),
            StockMode::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for StockMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(StockMode::Replace),
            "add" => Ok(StockMode::Add),
            "skip" => Ok(StockMode::Skip),
            other => Err(format!("无效的库存模式: {}（应为 replace/add/skip）", other)),
        }
    }
}

// ==========================================
// 行结果 (Row Outcome)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowOutcome {
    Created,
    Updated,
    Skipped,
    Error,
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOutcome::Created => write!(f, "created"),
            RowOutcome::Updated => write!(f, "updated"),
            RowOutcome::Skipped => write!(f, "skipped"),
            RowOutcome::Error => write!(f, "error"),
        }
    }
}

// ==========================================
// 供货状态 (Supply Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupplyStatus {
    Success,
    Failed,
    DryRun,
}

impl fmt::Display for SupplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplyStatus::Success => write!(f, "success"),
            SupplyStatus::Failed => write!(f, "failed"),
            SupplyStatus::DryRun => write!(f, "dry-run"),
        }
    }
}

impl FromStr for SupplyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(SupplyStatus::Success),
            "failed" => Ok(SupplyStatus::Failed),
            "dry-run" => Ok(SupplyStatus::DryRun),
            other => Err(format!("无效的供货状态: {}", other)),
        }
    }
}

// ==========================================
// 表格版式 (Sheet Format)
// ==========================================
// 封闭集合 + Unknown（回退到固定位置映射）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetFormat {
    HeaderKeyword, // 版式 A: 表头关键字
    MetadataFirst, // 版式 B: 首行元数据 + 固定列
    GenericHeader, // 通用表头
    Unknown,       // 无表头，固定 4 列
}

impl SheetFormat {
    /// 是否允许"续行"（品种为空、数量与单价存在时沿用上下文）
    pub fn allows_continuation(&self) -> bool {
        matches!(self, SheetFormat::HeaderKeyword | SheetFormat::MetadataFirst)
    }
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetFormat::HeaderKeyword => write!(f, "header_keyword"),
            SheetFormat::MetadataFirst => write!(f, "metadata_first"),
            SheetFormat::GenericHeader => write!(f, "generic_header"),
            SheetFormat::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for SheetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header_keyword" => Ok(SheetFormat::HeaderKeyword),
            "metadata_first" => Ok(SheetFormat::MetadataFirst),
            "generic_header" => Ok(SheetFormat::GenericHeader),
            "unknown" => Ok(SheetFormat::Unknown),
            other => Err(format!("无效的表格版式: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_mode_from_str() {
        assert_eq!("ADD".parse::<StockMode>().unwrap(), StockMode::Add);
        assert_eq!(" skip ".parse::<StockMode>().unwrap(), StockMode::Skip);
        assert!("merge".parse::<StockMode>().is_err());
    }

    #[test]
    fn test_supply_status_serde() {
        let json = serde_json::to_string(&SupplyStatus::DryRun).unwrap();
        assert_eq!(json, "\"dry-run\"");
        assert_eq!("dry-run".parse::<SupplyStatus>().unwrap(), SupplyStatus::DryRun);
    }
}
