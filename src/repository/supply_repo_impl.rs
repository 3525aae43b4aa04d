// ==========================================
// 花卉供货导入 - 供货 Repository 实现
// ==========================================
// 职责: 实现花卉/规格/供货记录数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 存储: 供货行/错误/警告以 JSON 列保存；金额以十进制文本保存
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::catalog::{Flower, NewFlower, NewVariant, Variant, VariantUpdate};
use crate::domain::supply::{SupplyRecord, SupplySummary};
use crate::domain::types::{SheetFormat, SupplyStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::supply_repo::SupplyRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const FLOWER_COLUMNS: &str = "id, name, slug, created_at, updated_at";
const VARIANT_COLUMNS: &str =
    "id, flower_id, length, grade, stock, cost_price, price, created_at, updated_at";
const SUMMARY_COLUMNS: &str =
    "id, filename, checksum, parsed_at, supply_status, total_rows, valid_rows, published_at";

// 文本列 → 枚举（解析失败转为 rusqlite 转换错误）
fn parse_column<T: FromStr<Err = String>>(row: &Row, idx: usize, field: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|message| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(RepositoryError::FieldValueError {
                field: field.to_string(),
                message,
            }),
        )
    })
}

// 金额文本列 → Decimal
fn decimal_column(row: &Row, idx: usize, field: &str) -> rusqlite::Result<Option<Decimal>> {
    let Some(raw) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    Decimal::from_str(&raw).map(Some).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(RepositoryError::FieldValueError {
                field: field.to_string(),
                message: format!("{} ({})", e, raw),
            }),
        )
    })
}

fn required_decimal(row: &Row, idx: usize, field: &str) -> rusqlite::Result<Decimal> {
    decimal_column(row, idx, field)?
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(idx, field.to_string(), Type::Null))
}

fn map_flower(row: &Row) -> rusqlite::Result<Flower> {
    Ok(Flower {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn map_variant(row: &Row) -> rusqlite::Result<Variant> {
    Ok(Variant {
        id: row.get(0)?,
        flower_id: row.get(1)?,
        length: row.get(2)?,
        grade: row.get(3)?,
        stock: row.get(4)?,
        cost_price: required_decimal(row, 5, "cost_price")?,
        price: required_decimal(row, 6, "price")?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn map_summary(row: &Row) -> rusqlite::Result<SupplySummary> {
    Ok(SupplySummary {
        id: row.get(0)?,
        filename: row.get(1)?,
        checksum: row.get(2)?,
        parsed_at: row.get(3)?,
        supply_status: parse_column::<SupplyStatus>(row, 4, "supply_status")?,
        total_rows: row.get::<_, i64>(5)? as usize,
        valid_rows: row.get::<_, i64>(6)? as usize,
        published_at: row.get(7)?,
    })
}

// ==========================================
// SupplyRepositoryImpl
// ==========================================
pub struct SupplyRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl SupplyRepositoryImpl {
    /// 打开（必要时创建）数据库
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 复用已有连接（与 ConfigManager 共享）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn select_flower(conn: &Connection, flower_id: &str) -> RepositoryResult<Flower> {
        conn.query_row(
            &format!("SELECT {} FROM flowers WHERE id = ?1", FLOWER_COLUMNS),
            params![flower_id],
            map_flower,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "Flower".to_string(),
            id: flower_id.to_string(),
        })
    }

    fn select_variant(conn: &Connection, variant_id: &str) -> RepositoryResult<Variant> {
        conn.query_row(
            &format!("SELECT {} FROM variants WHERE id = ?1", VARIANT_COLUMNS),
            params![variant_id],
            map_variant,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "Variant".to_string(),
            id: variant_id.to_string(),
        })
    }

    fn select_summary(conn: &Connection, supply_id: &str) -> RepositoryResult<SupplySummary> {
        conn.query_row(
            &format!("SELECT {} FROM supplies WHERE id = ?1", SUMMARY_COLUMNS),
            params![supply_id],
            map_summary,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "Supply".to_string(),
            id: supply_id.to_string(),
        })
    }
}

#[async_trait]
impl SupplyRepository for SupplyRepositoryImpl {
    async fn find_flower_by_slug(&self, slug: &str) -> RepositoryResult<Option<Flower>> {
        let conn = self.lock()?;
        let flower = conn
            .query_row(
                &format!("SELECT {} FROM flowers WHERE slug = ?1", FLOWER_COLUMNS),
                params![slug],
                map_flower,
            )
            .optional()?;
        Ok(flower)
    }

    async fn create_flower(&self, flower: NewFlower) -> RepositoryResult<Flower> {
        let conn = self.lock()?;
        let now = Utc::now();
        let created = Flower {
            id: Uuid::new_v4().to_string(),
            name: flower.name,
            slug: flower.slug,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO flowers (id, name, slug, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![created.id, created.name, created.slug, created.created_at, created.updated_at],
        )?;
        Ok(created)
    }

    async fn update_flower(&self, flower_id: &str) -> RepositoryResult<Flower> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE flowers SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now(), flower_id],
        )?;
        Self::select_flower(&conn, flower_id)
    }

    async fn find_variant(&self, flower_id: &str, length: i64) -> RepositoryResult<Option<Variant>> {
        let conn = self.lock()?;
        let variant = conn
            .query_row(
                &format!(
                    "SELECT {} FROM variants WHERE flower_id = ?1 AND length = ?2",
                    VARIANT_COLUMNS
                ),
                params![flower_id, length],
                map_variant,
            )
            .optional()?;
        Ok(variant)
    }

    async fn create_variant(&self, variant: NewVariant) -> RepositoryResult<Variant> {
        let conn = self.lock()?;
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

        conn.execute(
            r#"
            INSERT INTO variants (
                id, flower_id, length, grade, stock, cost_price, price, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                created.id,
                created.flower_id,
                created.length,
                created.grade,
                created.stock,
                created.cost_price.to_string(),
                created.price.to_string(),
                created.created_at,
                created.updated_at,
            ],
        )?;
        Ok(created)
    }

    async fn update_variant(&self, variant_id: &str, update: VariantUpdate) -> RepositoryResult<Variant> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE variants SET stock = ?1, cost_price = ?2, updated_at = ?3 WHERE id = ?4",
            params![update.stock, update.cost_price.to_string(), Utc::now(), variant_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Variant".to_string(),
                id: variant_id.to_string(),
            });
        }
        Self::select_variant(&conn, variant_id)
    }

    async fn find_supply_by_checksum(&self, checksum: &str) -> RepositoryResult<Option<SupplySummary>> {
        let conn = self.lock()?;
        let summary = conn
            .query_row(
                &format!(
                    "SELECT {} FROM supplies WHERE checksum = ?1 AND supply_status != 'dry-run' ORDER BY parsed_at DESC LIMIT 1",
                    SUMMARY_COLUMNS
                ),
                params![checksum],
                map_summary,
            )
            .optional()?;
        Ok(summary)
    }

    async fn create_supply(&self, record: &SupplyRecord) -> RepositoryResult<()> {
        let rows_json = serde_json::to_string(&record.rows)?;
        let errors_json = serde_json::to_string(&record.supply_errors)?;
        let warnings_json = serde_json::to_string(&record.supply_warnings)?;

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO supplies (
                id, filename, checksum, parsed_at, awb, supplier, document_id, ship_date,
                transport_cost, total_boxes, format, total_rows, valid_rows, rows_json,
                supply_status, errors_json, warnings_json, uploaded_by, published_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
            )
            "#,
            params![
                record.id,
                record.filename,
                record.checksum,
                record.parsed_at,
                record.awb,
                record.supplier,
                record.document_id,
                record.ship_date,
                record.transport_cost.map(|cost| cost.to_string()),
                record.total_boxes,
                record.format.to_string(),
                record.total_rows as i64,
                record.valid_rows as i64,
                rows_json,
                record.supply_status.to_string(),
                errors_json,
                warnings_json,
                record.uploaded_by,
                record.published_at,
            ],
        )?;
        Ok(())
    }

    async fn publish_supply(&self, supply_id: &str) -> RepositoryResult<SupplySummary> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE supplies SET published_at = ?1 WHERE id = ?2",
            params![Utc::now(), supply_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Supply".to_string(),
                id: supply_id.to_string(),
            });
        }
        Self::select_summary(&conn, supply_id)
    }

    async fn get_supply(&self, supply_id: &str) -> RepositoryResult<Option<SupplyRecord>> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                r#"
                SELECT id, filename, checksum, parsed_at, awb, supplier, document_id, ship_date,
                       transport_cost, total_boxes, format, total_rows, valid_rows, rows_json,
                       supply_status, errors_json, warnings_json, uploaded_by, published_at
                FROM supplies WHERE id = ?1
                "#,
                params![supply_id],
                |row| {
                    let record = SupplyRecord {
                        id: row.get(0)?,
                        filename: row.get(1)?,
                        checksum: row.get(2)?,
                        parsed_at: row.get(3)?,
                        awb: row.get(4)?,
                        supplier: row.get(5)?,
                        document_id: row.get(6)?,
                        ship_date: row.get(7)?,
                        transport_cost: decimal_column(row, 8, "transport_cost")?,
                        total_boxes: row.get(9)?,
                        format: parse_column::<SheetFormat>(row, 10, "format")?,
                        total_rows: row.get::<_, i64>(11)? as usize,
                        valid_rows: row.get::<_, i64>(12)? as usize,
                        rows: Vec::new(),
                        supply_status: parse_column::<SupplyStatus>(row, 14, "supply_status")?,
                        supply_errors: Vec::new(),
                        supply_warnings: Vec::new(),
                        uploaded_by: row.get(17)?,
                        published_at: row.get(18)?,
                    };
                    let rows_json: String = row.get(13)?;
                    let errors_json: String = row.get(15)?;
                    let warnings_json: String = row.get(16)?;
                    Ok((record, rows_json, errors_json, warnings_json))
                },
            )
            .optional()?;

        let Some((mut record, rows_json, errors_json, warnings_json)) = raw else {
            return Ok(None);
        };
        record.rows = serde_json::from_str(&rows_json)?;
        record.supply_errors = serde_json::from_str(&errors_json)?;
        record.supply_warnings = serde_json::from_str(&warnings_json)?;
        Ok(Some(record))
    }

    async fn list_recent_supplies(&self, limit: usize) -> RepositoryResult<Vec<SupplySummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM supplies ORDER BY parsed_at DESC LIMIT ?1",
            SUMMARY_COLUMNS
        ))?;
        let rows = stmt.query_map(params![limit as i64], map_summary)?;

        let mut summaries = Vec::new();
        for summary in rows {
            summaries.push(summary?);
        }
        Ok(summaries)
    }
}
