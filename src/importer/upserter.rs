// ==========================================
// 花卉供货导入 - 合并入库
// ==========================================
// 职责:
// 1. 按合并键（slug + 有效长度）聚合有效行: 库存求和、单价按库存加权（保留 2 位）
// 2. 按花卉逐个 查找/创建，按规格逐个 查找/更新/创建
// 3. 每个聚合组的结果回写到组内所有原始行哈希
// 红线:
// - 已有规格只改库存与成本价，零售价不动
// - 任一持久化错误立即中止（已写入部分保留）
// ==========================================

use crate::domain::catalog::{NewFlower, NewVariant, VariantUpdate};
use crate::domain::supply::{ImportOptions, NormalizedRow, RowWarning, UpsertCounts};
use crate::domain::types::RowOutcome;
use crate::engine::pricing::{apply_stock_mode, new_variant_price};
use crate::engine::rate_provider::{ensure_valid_rate, RateProvider};
use crate::importer::error::ImportResult;
use crate::importer::variant_key::{variant_key, VariantKey};
use crate::repository::supply_repo::SupplyRepository;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

// ==========================================
// AggregatedRow - 聚合行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub key: VariantKey,
    /// 组内最后一行的元数据，stock/price 为聚合值
    pub row: NormalizedRow,
    pub member_hashes: Vec<String>,
    pub member_rows: Vec<usize>,
}

/// 入库产出
#[derive(Debug, Clone, Default)]
pub struct UpsertOutcome {
    pub counts: UpsertCounts,
    pub row_outcomes: HashMap<String, RowOutcome>,
    pub warnings: Vec<RowWarning>,
    pub aggregated: Vec<AggregatedRow>,
}

/// 按合并键聚合（保持首次出现顺序）
pub fn aggregate_rows(rows: &[NormalizedRow]) -> (Vec<AggregatedRow>, Vec<RowWarning>) {
    let mut order: Vec<VariantKey> = Vec::new();
    let mut groups: HashMap<VariantKey, Vec<&NormalizedRow>> = HashMap::new();

    for row in rows {
        let key = variant_key(&row.slug, row.length, row.grade.as_deref());
        let members = groups.entry(key.clone()).or_default();
        if members.is_empty() {
            order.push(key);
        }
        members.push(row);
    }

    let mut aggregated = Vec::with_capacity(order.len());
    let mut warnings = Vec::new();

    for key in order {
        let members = groups.remove(&key).unwrap_or_default();
        let Some(last) = members.last() else { continue };

        let stock: i64 = members.iter().map(|r| r.stock).sum();
        let weighted: Decimal = members.iter().map(|r| Decimal::from(r.stock) * r.price).sum();
        // 加权单价不舍入，成本按 Decimal 精度保留
        let price = if stock > 0 {
            weighted / Decimal::from(stock)
        } else {
            last.price
        };

        if members.len() > 1 {
            let stock_terms: Vec<String> = members.iter().map(|r| r.stock.to_string()).collect();
            let price_terms: Vec<String> = members
                .iter()
                .map(|r| format!("{}×{}", r.stock, r.price))
                .collect();
            warnings.push(
                RowWarning::new(
                    members[0].row_number,
                    "aggregation",
                    format!(
                        "{} 行合并为同一规格: 库存 {} = {}，加权单价 ({}) / {} ≈ {}",
                        members.len(),
                        stock_terms.join(" + "),
                        stock,
                        price_terms.join(" + "),
                        stock,
                        price.round_dp(4)
                    ),
                )
                .with_values(members.len(), &key),
            );
        }

        let mut row = (*last).clone();
        row.stock = stock;
        row.price = price;

        aggregated.push(AggregatedRow {
            member_hashes: members.iter().map(|r| r.hash.clone()).collect(),
            member_rows: members.iter().map(|r| r.row_number).collect(),
            key,
            row,
        });
    }

    (aggregated, warnings)
}

// ==========================================
// SupplyUpserter
// ==========================================
pub struct SupplyUpserter<R, P>
where
    R: SupplyRepository,
    P: RateProvider,
{
    repo: Arc<R>,
    rate_provider: Arc<P>,
    markup_factor: Decimal,
}

impl<R, P> SupplyUpserter<R, P>
where
    R: SupplyRepository,
    P: RateProvider,
{
    pub fn new(repo: Arc<R>, rate_provider: Arc<P>, markup_factor: Decimal) -> Self {
        Self {
            repo,
            rate_provider,
            markup_factor,
        }
    }

    /// 聚合并入库
    ///
    /// # 错误
    /// - Persistence: 任一读写失败（中止）
    /// - RateUnavailable: 需要新建规格但汇率不可用
    pub async fn upsert(&self, rows: &[NormalizedRow], options: &ImportOptions) -> ImportResult<UpsertOutcome> {
        let (aggregated, warnings) = aggregate_rows(rows);
        let mut outcome = UpsertOutcome {
            warnings,
            ..UpsertOutcome::default()
        };

        // 按 slug 分组（首次出现顺序）
        let mut slug_order: Vec<&str> = Vec::new();
        let mut by_slug: HashMap<&str, Vec<&AggregatedRow>> = HashMap::new();
        for agg in &aggregated {
            let group = by_slug.entry(agg.key.slug.as_str()).or_default();
            if group.is_empty() {
                slug_order.push(agg.key.slug.as_str());
            }
            group.push(agg);
        }

        // 汇率只在首次新建规格时获取
        let mut rate: Option<Decimal> = None;

        for slug in slug_order {
            let group = by_slug.remove(slug).unwrap_or_default();
            let Some(first) = group.first() else { continue };

            let flower = match self.repo.find_flower_by_slug(slug).await? {
                Some(existing) => {
                    outcome.counts.flowers_updated += 1;
                    self.repo.update_flower(&existing.id).await?
                }
                None => {
                    outcome.counts.flowers_created += 1;
                    self.repo
                        .create_flower(NewFlower {
                            name: first.row.flower_name.clone(),
                            slug: slug.to_string(),
                        })
                        .await?
                }
            };

            for agg in group {
                let incoming = &agg.row;
                let row_outcome = match self.repo.find_variant(&flower.id, agg.key.effective_length).await? {
                    Some(existing) => {
                        let stock = apply_stock_mode(existing.stock, incoming.stock, options.stock_mode);
                        self.repo
                            .update_variant(
                                &existing.id,
                                VariantUpdate {
                                    stock,
                                    cost_price: incoming.price,
                                },
                            )
                            .await?;
                        debug!(slug, length = agg.key.effective_length, old_stock = existing.stock, stock, "规格已更新");
                        outcome.counts.variants_updated += 1;
                        RowOutcome::Updated
                    }
                    None => {
                        let current_rate = match rate {
                            Some(r) => r,
                            None => {
                                let fetched = ensure_valid_rate(self.rate_provider.get_rate().await?)?;
                                rate = Some(fetched);
                                fetched
                            }
                        };
                        let price = new_variant_price(incoming.price, self.markup_factor, current_rate);
                        self.repo
                            .create_variant(NewVariant {
                                flower_id: flower.id.clone(),
                                length: agg.key.effective_length,
                                grade: incoming.grade.clone(),
                                stock: incoming.stock,
                                cost_price: incoming.price,
                                price,
                            })
                            .await?;
                        debug!(slug, length = agg.key.effective_length, stock = incoming.stock, price = %price, "规格已创建");
                        outcome.counts.variants_created += 1;
                        RowOutcome::Created
                    }
                };

                for hash in &agg.member_hashes {
                    outcome.row_outcomes.insert(hash.clone(), row_outcome);
                }
            }
        }

        info!(
            flowers_created = outcome.counts.flowers_created,
            flowers_updated = outcome.counts.flowers_updated,
            variants_created = outcome.counts.variants_created,
            variants_updated = outcome.counts.variants_updated,
            "入库完成"
        );

        outcome.aggregated = aggregated;
        Ok(outcome)
    }
}
