// ==========================================
// 花卉供货导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::StockMode;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use rust_decimal::Decimal;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 新规格零售价加价系数
    ///
    /// # 默认值
    /// - 1.10
    async fn get_markup_factor(&self) -> RepositoryResult<Decimal>;

    /// EUR → 本币汇率（ConfigRateProvider 使用）
    ///
    /// # 默认值
    /// - 45.0
    async fn get_eur_rate(&self) -> RepositoryResult<Decimal>;

    /// 未显式指定时的库存合并模式
    ///
    /// # 默认值
    /// - replace
    async fn get_default_stock_mode(&self) -> RepositoryResult<StockMode>;
}
