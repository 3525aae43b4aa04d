// ==========================================
// 花卉供货导入 - 汇率提供者
// ==========================================
// 职责: EUR → 本币汇率（新规格定价使用）
// 说明: 缓存与兜底由提供者自行负责，导入流程只调用 get_rate
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// 当前 EUR → 本币汇率（正数）
    async fn get_rate(&self) -> ImportResult<Decimal>;
}

/// 汇率有效性检查（必须为正数）
pub fn ensure_valid_rate(rate: Decimal) -> ImportResult<Decimal> {
    if rate > Decimal::ZERO {
        Ok(rate)
    } else {
        Err(ImportError::RateUnavailable(format!("无效汇率: {}", rate)))
    }
}

// ==========================================
// FixedRateProvider - 固定汇率
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct FixedRateProvider {
    rate: Decimal,
}

impl FixedRateProvider {
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn get_rate(&self) -> ImportResult<Decimal> {
        ensure_valid_rate(self.rate)
    }
}

// ==========================================
// ConfigRateProvider - 读取 config_kv.eur_rate
// ==========================================
pub struct ConfigRateProvider<C: ImportConfigReader> {
    config: Arc<C>,
}

impl<C: ImportConfigReader> ConfigRateProvider<C> {
    pub fn new(config: Arc<C>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<C: ImportConfigReader> RateProvider for ConfigRateProvider<C> {
    async fn get_rate(&self) -> ImportResult<Decimal> {
        let rate = self
            .config
            .get_eur_rate()
            .await
            .map_err(|e| ImportError::RateUnavailable(e.to_string()))?;
        ensure_valid_rate(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_rate_provider() {
        let rate = Decimal::new(415, 1);
        assert_eq!(FixedRateProvider::new(rate).get_rate().await.unwrap(), rate);

        let err = FixedRateProvider::new(Decimal::ZERO).get_rate().await.unwrap_err();
        assert_eq!(err.code(), "RATE_UNAVAILABLE");

        assert!(FixedRateProvider::new(Decimal::NEGATIVE_ONE).get_rate().await.is_err());
    }
}
