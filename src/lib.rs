// ==========================================
// 花卉供货导入 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: 供应商发票（Excel/CSV）→ 花卉/规格库存与成本价
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 定价/库存规则
pub mod engine;

// 导入层 - 供货单导入管道
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    Flower, ImportOptions, ImportResult, RowOutcome, SheetFormat, StockMode, SupplyRecord,
    SupplyStatus, Variant,
};
pub use importer::{ImportError, SupplyImportOrchestrator, SupplyImporter};
pub use api::{ApiError, ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "花卉供货导入";
