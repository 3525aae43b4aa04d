// ==========================================
// 花卉供货导入 - 供货 Repository Trait
// ==========================================
// 职责: 定义花卉/规格/供货记录的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::catalog::{Flower, NewFlower, NewVariant, Variant, VariantUpdate};
use crate::domain::supply::{SupplyRecord, SupplySummary};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// SupplyRepository Trait
// ==========================================
// 用途: 导入流程依赖的持久化接口
// 实现者: SupplyRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait SupplyRepository: Send + Sync {
    // ===== 花卉 =====

    /// 按 slug 查找花卉
    async fn find_flower_by_slug(&self, slug: &str) -> RepositoryResult<Option<Flower>>;

    /// 创建花卉
    ///
    /// # 返回
    /// - Ok(Flower): 新记录（含生成的 id 与时间戳）
    /// - Err(UniqueConstraintViolation): slug 已存在
    async fn create_flower(&self, flower: NewFlower) -> RepositoryResult<Flower>;

    /// 刷新花卉的 updated_at（导入命中已有花卉时调用）
    async fn update_flower(&self, flower_id: &str) -> RepositoryResult<Flower>;

    // ===== 规格 =====

    /// 按 (flower_id, 有效长度) 查找规格
    async fn find_variant(&self, flower_id: &str, length: i64) -> RepositoryResult<Option<Variant>>;

    async fn create_variant(&self, variant: NewVariant) -> RepositoryResult<Variant>;

    /// 更新规格库存与成本价（零售价不变）
    async fn update_variant(&self, variant_id: &str, update: VariantUpdate) -> RepositoryResult<Variant>;

    // ===== 供货记录 =====

    /// 按文件校验和查找最近一次供货记录（dry-run 记录不参与查重）
    async fn find_supply_by_checksum(&self, checksum: &str) -> RepositoryResult<Option<SupplySummary>>;

    /// 写入供货记录（未发布）
    async fn create_supply(&self, record: &SupplyRecord) -> RepositoryResult<()>;

    /// 发布供货记录（写入 published_at）
    async fn publish_supply(&self, supply_id: &str) -> RepositoryResult<SupplySummary>;

    async fn get_supply(&self, supply_id: &str) -> RepositoryResult<Option<SupplyRecord>>;

    /// 最近的供货记录（按解析时间倒序）
    async fn list_recent_supplies(&self, limit: usize) -> RepositoryResult<Vec<SupplySummary>>;
}
