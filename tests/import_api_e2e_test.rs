// ==========================================
// 导入 API 端到端测试
// ==========================================
// 真实 SQLite 数据库 + CSV 文件，模拟命令行调用的完整流程
// ==========================================

use flower_supply_import::api::{ApiError, ImportApi};
use flower_supply_import::config::config_keys;
use flower_supply_import::domain::supply::ImportOptions;
use flower_supply_import::domain::types::{RowOutcome, SheetFormat, StockMode, SupplyStatus};
use flower_supply_import::repository::{SupplyRepository, SupplyRepositoryImpl};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tempfile::TempDir;

const INVOICE_CSV: &str = "Invoice No. 2024/118;;;;\n\
Farm;Variety;Length;Stems;Price\n\
Rosaprima;Freedom;60;100;0,50\n\
Rosaprima;Explorer;70;50;2,00\n\
Rosaprima;Explorer;70;25;2,00\n";

struct Fixture {
    _dir: TempDir,
    db_path: String,
    invoice: PathBuf,
}

fn fixture(content: &str) -> Fixture {
    let dir = TempDir::new().expect("创建临时目录失败");
    let db_path = dir.path().join("supply.db").to_string_lossy().into_owned();
    let invoice = dir.path().join("invoice_118.csv");
    std::fs::write(&invoice, content).expect("写入测试文件失败");
    Fixture {
        _dir: dir,
        db_path,
        invoice,
    }
}

#[tokio::test]
async fn test_import_api_full_flow() {
    let fx = fixture(INVOICE_CSV);
    let api = ImportApi::new(fx.db_path.clone());
    let path = fx.invoice.to_string_lossy().into_owned();

    // 步骤 1: 首次导入
    let response = api
        .import_supply(&path, None, ImportOptions::default())
        .await
        .expect("导入失败");

    assert_eq!(response.filename, "invoice_118.csv");
    assert_eq!(response.result.status, SupplyStatus::Success);
    assert_eq!(response.result.stats.total_rows, 3);
    assert_eq!(response.result.stats.valid_rows, 3);
    assert_eq!(response.result.stats.flowers_created, 2);
    assert_eq!(response.result.stats.variants_created, 2);
    assert!(response.result.errors.is_empty());
    assert!(response.result.warnings.iter().any(|w| w.field == "aggregation"));

    // 步骤 2: 数据库中的花卉/规格
    let repo = SupplyRepositoryImpl::new(&fx.db_path).unwrap();
    let explorer = repo.find_flower_by_slug("explorer").await.unwrap().expect("应创建 Explorer");
    let variant = repo.find_variant(&explorer.id, 70).await.unwrap().expect("应创建 70cm 规格");
    assert_eq!(variant.stock, 75);
    assert_eq!(variant.cost_price, Decimal::from(2));
    assert_eq!(variant.price, Decimal::from(99));

    // 步骤 3: 供货记录
    let record = api.get_supply(&response.result.supply_id).await.unwrap();
    assert_eq!(record.format, SheetFormat::GenericHeader);
    assert_eq!(record.document_id.as_deref(), Some("2024/118"));
    assert_eq!(record.supplier.as_deref(), Some("Rosaprima"));
    assert!(record.published_at.is_some());
    assert!(record.rows.iter().all(|r| r.outcome == RowOutcome::Created));

    // 步骤 4: 重复导入被拒绝
    let err = api
        .import_supply(&path, None, ImportOptions::default())
        .await
        .unwrap_err();
    match err {
        ApiError::DuplicateFile { supply_id, .. } => assert_eq!(supply_id, response.result.supply_id),
        other => panic!("应为重复文件错误，实际: {:?}", other),
    }

    // 步骤 5: 历史
    let history = api.list_recent_supplies(10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, response.result.supply_id);
}

#[tokio::test]
async fn test_config_controls_stock_mode_and_pricing() {
    let fx = fixture(INVOICE_CSV);
    let api = ImportApi::new(fx.db_path.clone());
    let path = fx.invoice.to_string_lossy().into_owned();

    api.set_config(config_keys::EUR_RATE, "50").unwrap();
    api.set_config(config_keys::MARKUP_FACTOR, "1.2").unwrap();
    api.set_config(config_keys::DEFAULT_STOCK_MODE, "add").unwrap();

    api.import_supply(&path, None, ImportOptions::default()).await.unwrap();

    let repo = SupplyRepositoryImpl::new(&fx.db_path).unwrap();
    let explorer = repo.find_flower_by_slug("explorer").await.unwrap().unwrap();
    assert_eq!(repo.find_variant(&explorer.id, 70).await.unwrap().unwrap().price, Decimal::from(120));

    // 配置默认 add；显式 skip 优先
    let forced = ImportOptions {
        force_import: true,
        ..ImportOptions::default()
    };
    api.import_supply(&path, None, forced.clone()).await.unwrap();
    assert_eq!(repo.find_variant(&explorer.id, 70).await.unwrap().unwrap().stock, 150);

    api.import_supply(&path, Some(StockMode::Skip), forced).await.unwrap();
    assert_eq!(repo.find_variant(&explorer.id, 70).await.unwrap().unwrap().stock, 150);

    assert_eq!(api.list_recent_supplies(10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_dry_run_leaves_catalog_untouched() {
    let fx = fixture(INVOICE_CSV);
    let api = ImportApi::new(fx.db_path.clone());
    let path = fx.invoice.to_string_lossy().into_owned();

    let options = ImportOptions {
        dry_run: true,
        ..ImportOptions::default()
    };
    let response = api.import_supply(&path, None, options).await.unwrap();
    assert_eq!(response.result.status, SupplyStatus::DryRun);

    let repo = SupplyRepositoryImpl::new(&fx.db_path).unwrap();
    assert!(repo.find_flower_by_slug("freedom").await.unwrap().is_none());

    // dry-run 记录不参与查重
    let real = api.import_supply(&path, None, ImportOptions::default()).await.unwrap();
    assert_eq!(real.result.status, SupplyStatus::Success);
}

#[tokio::test]
async fn test_binary_garbage_is_rejected() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("supply.db").to_string_lossy().into_owned();
    let file = dir.path().join("photo.jpg");
    std::fs::write(&file, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x80, 0x81]).unwrap();

    let api = ImportApi::new(db_path);
    let err = api
        .import_supply(&file.to_string_lossy(), None, ImportOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    assert!(api.list_recent_supplies(5).await.unwrap().is_empty());
}
