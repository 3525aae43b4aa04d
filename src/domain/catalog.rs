// ==========================================
// 花卉供货导入 - 目录实体
// ==========================================
// 职责: 花卉(Flower) / 规格(Variant) 实体及写入 DTO
// 红线: slug 是跨导入的稳定主键；Variant.price 创建后不再被导入覆盖
// ==========================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Flower - 花卉
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flower {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFlower {
    pub name: String,
    pub slug: String,
}

// ==========================================
// Variant - 规格
// ==========================================
// 身份键: (flower_id, length)，等级规格按等级→长度查表换算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub flower_id: String,
    pub length: i64,             // 有效长度（cm）
    pub grade: Option<String>,   // 文本等级（无长度时）
    pub stock: i64,              // 库存（枝）
    pub cost_price: Decimal,     // 供应商成本（EUR）
    pub price: Decimal,          // 零售价（本币）
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVariant {
    pub flower_id: String,
    pub length: i64,
    pub grade: Option<String>,
    pub stock: i64,
    pub cost_price: Decimal,
    pub price: Decimal,
}

/// 规格更新：只允许修改库存与成本价
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantUpdate {
    pub stock: i64,
    pub cost_price: Decimal,
}
