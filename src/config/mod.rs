// ==========================================
// 花卉供货导入 - 配置层
// ==========================================
// 职责: 导入参数（加价系数、兜底汇率、默认库存模式）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_EUR_RATE};
pub use import_config_trait::ImportConfigReader;
