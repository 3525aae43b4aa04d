// ==========================================
// 花卉供货导入 - 校验和
// ==========================================
// 职责: 文件级 SHA-256（重复上传检测） + 行级 16 位哈希（文件内去重/结果追踪）
// 红线: 纯函数；按校验和查重见 SupplyRepository::find_supply_by_checksum
// ==========================================

use crate::engine::pricing::round2;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// 行哈希截断长度（hex 字符）
pub const ROW_HASH_LEN: usize = 16;

/// 整个文件内容的 SHA-256（小写 hex）
pub fn compute_file_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// 参与行哈希的归一化字段
#[derive(Debug, Clone, Copy)]
pub struct RowHashFields<'a> {
    pub name: &'a str,
    pub length: Option<i64>,
    pub grade: Option<&'a str>,
    pub stock: i64,
    pub price: Decimal,
    pub supplier: Option<&'a str>,
    pub awb: Option<&'a str>,
}

/// 行哈希: name 小写，缺失字段记为 "null"，单价按 2 位小数且去掉末尾 0，取 SHA-256 前 16 位
pub fn compute_row_hash(fields: &RowHashFields<'_>) -> String {
    let canonical = [
        fields.name.trim().to_lowercase(),
        fields
            .length
            .map(|l| l.to_string())
            .unwrap_or_else(|| "null".to_string()),
        fields.grade.unwrap_or("null").to_string(),
        fields.stock.to_string(),
        round2(fields.price).normalize().to_string(),
        fields.supplier.unwrap_or("null").to_string(),
        fields.awb.unwrap_or("null").to_string(),
    ]
    .join("|");

    let mut digest = format!("{:x}", Sha256::digest(canonical.as_bytes()));
    digest.truncate(ROW_HASH_LEN);
    digest
}
