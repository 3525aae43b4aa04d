// ==========================================
// 花卉供货导入 - 导入API
// ==========================================
// 职责: 面向命令行/宿主程序的导入入口
// - 读取文件、装配仓储/配置/汇率/编排器
// - 查询供货历史
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::supply::{ImportOptions, ImportResult as SupplyImportResult, SupplyRecord, SupplySummary};
use crate::domain::types::StockMode;
use crate::engine::rate_provider::ConfigRateProvider;
use crate::importer::orchestrator::SupplyImportOrchestrator;
use crate::importer::supply_importer_trait::SupplyImporter;
use crate::repository::supply_repo::SupplyRepository;
use crate::repository::supply_repo_impl::SupplyRepositoryImpl;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// 历史查询的最大条数
pub const MAX_HISTORY_LIMIT: usize = 500;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 源文件名（不含目录）
    pub filename: String,
    /// 导入结果（供货记录ID、状态、统计、错误、警告、归一化行）
    #[serde(flatten)]
    pub result: SupplyImportResult,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 导入供货单
    ///
    /// # 参数
    /// - file_path: 文件路径（xlsx/xls/csv，按内容识别）
    /// - stock_mode: 库存模式；None 时使用配置 default_stock_mode
    /// - options: 其余导入选项（其中 stock_mode 字段会被上一个参数决定）
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果（行级错误不视为失败）
    /// - Err(ApiError): 致命错误（重复文件、无法解析、汇率不可用、数据库错误）
    pub async fn import_supply(
        &self,
        file_path: &str,
        stock_mode: Option<StockMode>,
        options: ImportOptions,
    ) -> ApiResult<ImportApiResponse> {
        let start = Instant::now();

        let path = Path::new(file_path);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ApiError::InvalidInput(format!("无效的文件路径: {}", file_path)))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::InvalidInput(format!("读取文件 {} 失败: {}", file_path, e)))?;

        let (repo, config) = self.open()?;
        let config = Arc::new(config);

        let options = ImportOptions {
            stock_mode: match stock_mode {
                Some(mode) => mode,
                None => config.get_default_stock_mode().await?,
            },
            ..options
        };
        let markup_factor = config.get_markup_factor().await?;

        let orchestrator = SupplyImportOrchestrator::with_defaults(
            Arc::new(repo),
            Arc::new(ConfigRateProvider::new(Arc::clone(&config))),
            markup_factor,
        );
        let result = orchestrator.process_file(&bytes, &filename, &options).await?;

        let elapsed_ms = start.elapsed().as_millis() as i64;
        info!(
            supply_id = %result.supply_id,
            status = %result.status,
            elapsed_ms,
            "导入API完成"
        );

        Ok(ImportApiResponse {
            filename,
            result,
            elapsed_ms,
        })
    }

    /// 最近的供货记录（按解析时间倒序）
    pub async fn list_recent_supplies(&self, limit: usize) -> ApiResult<Vec<SupplySummary>> {
        if limit == 0 || limit > MAX_HISTORY_LIMIT {
            return Err(ApiError::InvalidInput(format!(
                "limit 必须在 1..={} 之间，实际 {}",
                MAX_HISTORY_LIMIT, limit
            )));
        }
        let (repo, _) = self.open()?;
        Ok(repo.list_recent_supplies(limit).await?)
    }

    /// 查询单条供货记录（含逐行明细）
    pub async fn get_supply(&self, supply_id: &str) -> ApiResult<SupplyRecord> {
        let (repo, _) = self.open()?;
        repo.get_supply(supply_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Supply(id={})不存在", supply_id)))
    }

    /// 写入全局配置（markup_factor / eur_rate / default_stock_mode）
    pub fn set_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let (_, config) = self.open()?;
        config.set_global_config_value(key, value)?;
        Ok(())
    }

    /// 仓储与配置共享同一连接
    fn open(&self) -> ApiResult<(SupplyRepositoryImpl, ConfigManager)> {
        let repo = SupplyRepositoryImpl::new(&self.db_path)?;
        let config = ConfigManager::from_connection(repo.connection())?;
        Ok((repo, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("supply.db");
        let api = ImportApi::new(db.to_string_lossy().into_owned());

        let err = api
            .import_supply("/nonexistent/invoice.csv", None, ImportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_history_limit_bounds() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("supply.db");
        let api = ImportApi::new(db.to_string_lossy().into_owned());

        assert!(api.list_recent_supplies(0).await.is_err());
        assert!(api.list_recent_supplies(10).await.unwrap().is_empty());
        assert!(matches!(api.get_supply("missing").await, Err(ApiError::NotFound(_))));
    }
}
