// ==========================================
// 内存版 SupplyRepository - 用于集成测试
// ==========================================
// 记录每次调用，便于断言往返次数与顺序
// ==========================================

use async_trait::async_trait;
use chrono::Utc;
use flower_supply_import::domain::catalog::{Flower, NewFlower, NewVariant, Variant, VariantUpdate};
use flower_supply_import::domain::supply::{SupplyRecord, SupplySummary};
use flower_supply_import::domain::types::SupplyStatus;
use flower_supply_import::repository::{RepositoryError, RepositoryResult, SupplyRepository};
use rust_decimal::Decimal;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct State {
    flowers: Vec<Flower>,
    variants: Vec<Variant>,
    supplies: Vec<SupplyRecord>,
    calls: Vec<String>,
}

#[derive(Default)]
pub struct InMemoryRepo {
    state: Mutex<State>,
    /// 第 N 次 create_variant 调用返回错误（从 1 开始）
    fail_create_variant_at: Option<usize>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create_variant_at(n: usize) -> Self {
        Self {
            fail_create_variant_at: Some(n),
            ..Self::default()
        }
    }

    /// 预置花卉与规格
    pub fn seed_variant(&self, name: &str, slug: &str, length: i64, stock: i64, cost_price: Decimal, price: Decimal) -> Variant {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let flower_id = match state.flowers.iter().find(|f| f.slug == slug) {
            Some(f) => f.id.clone(),
            None => {
                let flower = Flower {
                    id: Uuid::new_v4().to_string(),
                    name: name.to_string(),
                    slug: slug.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                let id = flower.id.clone();
                state.flowers.push(flower);
                id
            }
        };
        let variant = Variant {
            id: Uuid::new_v4().to_string(),
            flower_id,
            length,
            grade: None,
            stock,
            cost_price,
            price,
            created_at: now,
            updated_at: now,
        };
        state.variants.push(variant.clone());
        variant
    }

    pub fn flowers(&self) -> Vec<Flower> {
        self.state.lock().unwrap().flowers.clone()
    }

    pub fn variants(&self) -> Vec<Variant> {
        self.state.lock().unwrap().variants.clone()
    }

    pub fn supplies(&self) -> Vec<SupplyRecord> {
        self.state.lock().unwrap().supplies.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn variant_by_slug(&self, slug: &str, length: i64) -> Option<Variant> {
        let state = self.state.lock().unwrap();
        let flower = state.flowers.iter().find(|f| f.slug == slug)?;
        state
            .variants
            .iter()
            .find(|v| v.flower_id == flower.id && v.length == length)
            .cloned()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

#[async_trait]
impl SupplyRepository for InMemoryRepo {
    async fn find_flower_by_slug(&self, slug: &str) -> RepositoryResult<Option<Flower>> {
        self.record("find_flower_by_slug");
        Ok(self.state.lock().unwrap().flowers.iter().find(|f| f.slug == slug).cloned())
    }

    async fn create_flower(&self, flower: NewFlower) -> RepositoryResult<Flower> {
        self.record("create_flower");
        let mut state = self.state.lock().unwrap();
        if state.flowers.iter().any(|f| f.slug == flower.slug) {
            return Err(RepositoryError::UniqueConstraintViolation(flower.slug));
        }
        let now = Utc::now();
        let created = Flower {
            id: Uuid::new_v4().to_string(),
            name: flower.name,
            slug: flower.slug,
            created_at: now,
            updated_at: now,
        };
        state.flowers.push(created.clone());
        Ok(created)
    }

    async fn update_flower(&self, flower_id: &str) -> RepositoryResult<Flower> {
        self.record("update_flower");
        let mut state = self.state.lock().unwrap();
        let flower = state
            .flowers
            .iter_mut()
            .find(|f| f.id == flower_id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Flower".to_string(),
                id: flower_id.to_string(),
            })?;
        flower.updated_at = Utc::now();
        Ok(flower.clone())
    }

    async fn find_variant(&self, flower_id: &str, length: i64) -> RepositoryResult<Option<Variant>> {
        self.record("find_variant");
        Ok(self
            .state
            .lock()
            .unwrap()
            .variants
            .iter()
            .find(|v| v.flower_id == flower_id && v.length == length)
            .cloned())
    }

    async fn create_variant(&self, variant: NewVariant) -> RepositoryResult<Variant> {
        self.record("create_variant");
        let attempts = self.calls().iter().filter(|c| *c == "create_variant").count();
        if self.fail_create_variant_at == Some(attempts) {
            return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
        }
        let now = Utc::now();
        let created = Variant {
            id: Uuid::new_v4().to_string(),
            flower_id: variant.flower_id,
            length: variant.length,
            grade: variant.grade,
            stock: variant.stock,
            cost_price: variant.cost_price,
            price: variant.price,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().variants.push(created.clone());
        Ok(created)
    }

    async fn update_variant(&self, variant_id: &str, update: VariantUpdate) -> RepositoryResult<Variant> {
        self.record("update_variant");
        let mut state = self.state.lock().unwrap();
        let variant = state
            .variants
            .iter_mut()
            .find(|v| v.id == variant_id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Variant".to_string(),
                id: variant_id.to_string(),
            })?;
        variant.stock = update.stock;
        variant.cost_price = update.cost_price;
        variant.updated_at = Utc::now();
        Ok(variant.clone())
    }

    async fn find_supply_by_checksum(&self, checksum: &str) -> RepositoryResult<Option<SupplySummary>> {
        self.record("find_supply_by_checksum");
        Ok(self
            .state
            .lock()
            .unwrap()
            .supplies
            .iter()
            .rev()
            .find(|s| s.checksum == checksum && s.supply_status != SupplyStatus::DryRun)
            .map(SupplyRecord::summary))
    }

    async fn create_supply(&self, record: &SupplyRecord) -> RepositoryResult<()> {
        self.record("create_supply");
        self.state.lock().unwrap().supplies.push(record.clone());
        Ok(())
    }

    async fn publish_supply(&self, supply_id: &str) -> RepositoryResult<SupplySummary> {
        self.record("publish_supply");
        let mut state = self.state.lock().unwrap();
        let supply = state
            .supplies
            .iter_mut()
            .find(|s| s.id == supply_id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Supply".to_string(),
                id: supply_id.to_string(),
            })?;
        supply.published_at = Some(Utc::now());
        Ok(supply.summary())
    }

    async fn get_supply(&self, supply_id: &str) -> RepositoryResult<Option<SupplyRecord>> {
        self.record("get_supply");
        Ok(self.state.lock().unwrap().supplies.iter().find(|s| s.id == supply_id).cloned())
    }

    async fn list_recent_supplies(&self, limit: usize) -> RepositoryResult<Vec<SupplySummary>> {
        self.record("list_recent_supplies");
        Ok(self
            .state
            .lock()
            .unwrap()
            .supplies
            .iter()
            .rev()
            .take(limit)
            .map(SupplyRecord::summary)
            .collect())
    }
}
