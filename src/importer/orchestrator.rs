// ==========================================
// 花卉供货导入 - 导入编排器
// ==========================================
// 职责: 整合导入流程，从文件到供货记录
// 流程: 校验和 → 查重 → 解析 → 覆盖值 → 归一化 → 校验 → 入库 → 供货记录 → 发布
// 红线:
// - 致命错误不落供货记录
// - 行级错误/警告只进入结果与供货记录，不中断流程
// ==========================================

use crate::domain::sheet::ParsedRow;
use crate::domain::supply::{
    ImportOptions, ImportResult as SupplyImportResult, ImportStats, NormalizedRow, RowError,
    SupplyRecord, SupplyRowEntry, UpsertCounts,
};
use crate::domain::types::{RowOutcome, SupplyStatus};
use crate::engine::rate_provider::RateProvider;
use crate::importer::checksum::compute_file_hash;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::normalizer::Normalizer;
use crate::importer::parser::{allocate_transport_cost, InvoiceParser, ParsedSheet};
use crate::importer::supply_importer_trait::SupplyImporter;
use crate::importer::upserter::SupplyUpserter;
use crate::importer::validator::validate;
use crate::repository::supply_repo::SupplyRepository;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// SupplyImportOrchestrator
// ==========================================
pub struct SupplyImportOrchestrator<R, P>
where
    R: SupplyRepository,
    P: RateProvider,
{
    repo: Arc<R>,
    parser: InvoiceParser,
    normalizer: Normalizer,
    upserter: SupplyUpserter<R, P>,
}

impl<R, P> SupplyImportOrchestrator<R, P>
where
    R: SupplyRepository,
    P: RateProvider,
{
    /// 创建编排器
    ///
    /// # 参数
    /// - repo: 供货仓储
    /// - rate_provider: 汇率提供者
    /// - parser: 供货单解析器
    /// - normalizer: 归一化器（持有同义词表）
    /// - markup_factor: 新规格加价系数
    pub fn new(
        repo: Arc<R>,
        rate_provider: Arc<P>,
        parser: InvoiceParser,
        normalizer: Normalizer,
        markup_factor: Decimal,
    ) -> Self {
        Self {
            upserter: SupplyUpserter::new(Arc::clone(&repo), rate_provider, markup_factor),
            repo,
            parser,
            normalizer,
        }
    }

    /// 使用默认解析器与同义词表
    pub fn with_defaults(repo: Arc<R>, rate_provider: Arc<P>, markup_factor: Decimal) -> Self {
        Self::new(
            repo,
            rate_provider,
            InvoiceParser::default(),
            Normalizer::default(),
            markup_factor,
        )
    }

    /// 解析之后的流程（归一化 → 校验 → 入库 → 供货记录）
    ///
    /// process_file 在查重与解析之后调用；也可直接传入已解析的行
    pub async fn process_parsed(
        &self,
        parsed: ParsedSheet,
        filename: &str,
        checksum: String,
        options: &ImportOptions,
    ) -> ImportResult<SupplyImportResult> {
        let ParsedSheet { detection, rows } = parsed;
        if rows.is_empty() {
            return Err(ImportError::ValidationFailed(format!(
                "文件 {} 中没有可导入的数据行",
                filename
            )));
        }
        let metadata = detection.metadata;

        // 覆盖值: 选项 > 行内值 > 文件级 AWB
        let rows: Vec<ParsedRow> = rows
            .into_iter()
            .map(|mut row| {
                if let Some(supplier) = &options.supplier {
                    row.supplier = Some(supplier.clone());
                }
                match &options.awb {
                    Some(awb) => row.awb = Some(awb.clone()),
                    None if row.awb.is_none() => row.awb = metadata.awb.clone(),
                    None => {}
                }
                row
            })
            .collect();

        let transport_shares: HashMap<usize, Decimal> = rows
            .iter()
            .zip(allocate_transport_cost(&rows, metadata.transport_cost))
            .filter_map(|(row, share)| share.map(|s| (row.row_number, s)))
            .collect();

        // 归一化 + 校验
        let (normalized, warnings) = self.normalizer.normalize(&rows);
        let validation = validate(normalized.clone(), warnings);
        let total_rows = normalized.len();
        let valid_rows = validation.valid.len();
        let mut warnings = validation.warnings;
        let errors = validation.errors;
        info!(total_rows, valid_rows, errors = errors.len(), "校验完成");

        // 入库
        let mut counts = UpsertCounts::default();
        let mut row_outcomes: HashMap<String, RowOutcome> = HashMap::new();
        if options.dry_run {
            debug!("dry-run: 跳过入库");
            for row in &validation.valid {
                row_outcomes.insert(row.hash.clone(), RowOutcome::Skipped);
            }
        } else if !validation.valid.is_empty() {
            let upserted = self.upserter.upsert(&validation.valid, options).await?;
            counts = upserted.counts;
            row_outcomes = upserted.row_outcomes;
            warnings.extend(upserted.warnings);
        }

        let status = if options.dry_run {
            SupplyStatus::DryRun
        } else if !errors.is_empty() && valid_rows == 0 {
            SupplyStatus::Failed
        } else {
            SupplyStatus::Success
        };

        // 供货记录
        let errors_by_row = group_errors(&errors);
        let entries: Vec<SupplyRowEntry> = normalized
            .iter()
            .map(|row| {
                let (outcome, error) = match errors_by_row.get(&row.row_number) {
                    Some(messages) => (RowOutcome::Error, Some(messages.join("; "))),
                    None => (
                        row_outcomes.get(&row.hash).copied().unwrap_or(RowOutcome::Skipped),
                        None,
                    ),
                };
                SupplyRowEntry {
                    row_number: row.row_number,
                    original: row.original.original.clone(),
                    normalized: row.snapshot(),
                    hash: row.hash.clone(),
                    outcome,
                    error,
                    transport_share: transport_shares.get(&row.row_number).copied(),
                }
            })
            .collect();

        let supply_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("supply_id", supply_id.as_str());

        let record = SupplyRecord {
            id: supply_id.clone(),
            filename: filename.to_string(),
            checksum,
            parsed_at: Utc::now(),
            awb: options
                .awb
                .clone()
                .or_else(|| metadata.awb.clone())
                .or_else(|| first_value(&normalized, |r| r.awb.as_deref())),
            supplier: options
                .supplier
                .clone()
                .or_else(|| first_value(&normalized, |r| r.supplier.as_deref())),
            document_id: metadata.document_id.clone(),
            ship_date: metadata.ship_date,
            transport_cost: metadata.transport_cost,
            total_boxes: metadata.total_boxes,
            format: detection.format,
            total_rows,
            valid_rows,
            rows: entries,
            supply_status: status,
            supply_errors: errors.clone(),
            supply_warnings: warnings.clone(),
            uploaded_by: options.user_id.clone(),
            published_at: None,
        };

        self.repo.create_supply(&record).await?;
        self.repo.publish_supply(&supply_id).await?;

        info!(
            supply_id = %supply_id,
            status = %status,
            warnings = warnings.len(),
            "供货记录已发布"
        );

        Ok(SupplyImportResult {
            supply_id,
            status,
            stats: ImportStats::new(total_rows, valid_rows, counts),
            errors,
            warnings,
            rows: normalized,
        })
    }
}

fn group_errors(errors: &[RowError]) -> HashMap<usize, Vec<String>> {
    let mut grouped: HashMap<usize, Vec<String>> = HashMap::new();
    for error in errors {
        grouped
            .entry(error.row)
            .or_default()
            .push(format!("{}: {}", error.field, error.message));
    }
    grouped
}

fn first_value<F>(rows: &[NormalizedRow], field: F) -> Option<String>
where
    F: Fn(&NormalizedRow) -> Option<&str>,
{
    rows.iter().find_map(|r| field(r)).map(str::to_string)
}

#[async_trait]
impl<R, P> SupplyImporter for SupplyImportOrchestrator<R, P>
where
    R: SupplyRepository,
    P: RateProvider,
{
    #[instrument(
        skip(self, bytes, filename, options),
        fields(filename = %filename, supply_id = tracing::field::Empty)
    )]
    async fn process_file(
        &self,
        bytes: &[u8],
        filename: &str,
        options: &ImportOptions,
    ) -> ImportResult<SupplyImportResult> {
        info!(size = bytes.len(), dry_run = options.dry_run, stock_mode = %options.stock_mode, "开始导入供货单");

        // === 步骤 1: 校验和 + 查重 ===
        let checksum = compute_file_hash(bytes);
        if options.force_import {
            debug!(checksum = %checksum, "force_import: 跳过查重");
        } else if let Some(existing) = self.repo.find_supply_by_checksum(&checksum).await? {
            warn!(existing_id = %existing.id, "重复文件");
            return Err(ImportError::DuplicateChecksum {
                supply_id: existing.id,
                imported_at: existing.parsed_at,
            });
        }

        // === 步骤 2: 解析 ===
        let parsed = self.parser.parse(bytes)?;

        // === 步骤 3+: 归一化 / 校验 / 入库 / 记录 ===
        self.process_parsed(parsed, filename, checksum, options).await
    }
}
