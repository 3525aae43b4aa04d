// ==========================================
// 花卉供货导入 - 导入接口 Trait
// ==========================================
// 职责: 定义供货导入接口（不包含实现）
// ==========================================

use crate::domain::sheet::Sheet;
use crate::domain::supply::{ImportOptions, ImportResult};
use crate::importer::error::ImportResult as Result;
use async_trait::async_trait;

// ==========================================
// SupplyImporter Trait
// ==========================================
// 用途: 供货导入主接口
// 实现者: SupplyImportOrchestrator
#[async_trait]
pub trait SupplyImporter: Send + Sync {
    /// 导入一份供货单
    ///
    /// # 参数
    /// - bytes: 文件原始内容
    /// - filename: 原始文件名（仅用于记录）
    /// - options: 导入选项（dry-run、库存模式、强制导入、覆盖值）
    ///
    /// # 返回
    /// - Ok(ImportResult): 导入结果（行级错误/警告在结果中，不算失败）
    /// - Err: 空文件、重复文件、格式不可读、汇率不可用、持久化失败
    ///
    /// # 导入流程
    /// 1. 文件校验和 + 重复检测（force_import 可跳过）
    /// 2. 版式识别 + 行提取
    /// 3. 覆盖值（AWB/供应商）
    /// 4. 归一化 + 校验
    /// 5. 合并写入花卉/规格（dry-run 不写）
    /// 6. 生成并发布供货记录
    async fn process_file(
        &self,
        bytes: &[u8],
        filename: &str,
        options: &ImportOptions,
    ) -> Result<ImportResult>;
}

// ==========================================
// SheetReader Trait
// ==========================================
// 用途: 原始字节 → 单元格矩阵
// 实现者: CsvSheetReader, ExcelSheetReader, UniversalSheetReader
pub trait SheetReader: Send + Sync {
    /// 读取第一个工作表
    ///
    /// # 返回
    /// - Ok(Sheet): 行列矩阵（行号、列号与源文件一致）
    /// - Err: 文件损坏或格式不支持
    fn read_sheet(&self, bytes: &[u8]) -> Result<Sheet>;
}
