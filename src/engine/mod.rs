// ==========================================
// 花卉供货导入 - 引擎层
// ==========================================
// 职责: 定价与库存规则、汇率来源
// 红线: Engine 不拼 SQL
// ==========================================

pub mod pricing;
pub mod rate_provider;

pub use pricing::{apply_stock_mode, new_variant_price, round2, DEFAULT_MARKUP_FACTOR};
pub use rate_provider::{ConfigRateProvider, FixedRateProvider, RateProvider};
