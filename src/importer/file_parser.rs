// ==========================================
// 花卉供货导入 - 表格读取器实现
// ==========================================
// 职责: 原始字节 → 单元格矩阵（Sheet）
// 支持: Excel (.xlsx/.xls, 第一个工作表) / CSV (.csv)
// 说明: 容器类型按文件头识别，不依赖扩展名
// ==========================================

use crate::domain::sheet::{Cell, Sheet};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::supply_importer_trait::SheetReader;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::debug;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvSheetReader;

impl SheetReader for CsvSheetReader {
    fn read_sheet(&self, bytes: &[u8]) -> ImportResult<Sheet> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = String::from_utf8_lossy(bytes);
        let delimiter = sniff_delimiter(text.lines().next().unwrap_or(""));

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut sheet = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<Cell> = record
                .iter()
                .map(|value| {
                    let trimmed = value.trim();
                    if trimmed.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(trimmed.to_string())
                    }
                })
                .collect();
            sheet.push(row);
        }

        debug!(rows = sheet.len(), delimiter = %(delimiter as char), "CSV 读取完成");
        Ok(sheet)
    }
}

/// 按首行出现次数选择分隔符（; , \t）
fn sniff_delimiter(first_line: &str) -> u8 {
    let candidates = [b';', b',', b'\t'];
    candidates
        .iter()
        .copied()
        .max_by_key(|d| first_line.matches(*d as char).count())
        .filter(|d| first_line.contains(*d as char))
        .unwrap_or(b',')
}

// ==========================================
// Excel Reader 实现
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcelKind {
    Xlsx,
    Xls,
}

pub struct ExcelSheetReader {
    pub kind: ExcelKind,
}

impl SheetReader for ExcelSheetReader {
    fn read_sheet(&self, bytes: &[u8]) -> ImportResult<Sheet> {
        let cursor = Cursor::new(bytes.to_vec());

        let range = match self.kind {
            ExcelKind::Xlsx => {
                let mut workbook: Xlsx<_> = Xlsx::new(cursor)?;
                let name = first_sheet_name(workbook.sheet_names())?;
                workbook.worksheet_range(&name)?
            }
            ExcelKind::Xls => {
                let mut workbook: Xls<_> = Xls::new(cursor)?;
                let name = first_sheet_name(workbook.sheet_names())?;
                workbook.worksheet_range(&name)?
            }
        };

        let sheet = range_to_sheet(&range);
        debug!(rows = sheet.len(), kind = ?self.kind, "Excel 读取完成");
        Ok(sheet)
    }
}

fn first_sheet_name(names: Vec<String>) -> ImportResult<String> {
    names
        .into_iter()
        .next()
        .ok_or_else(|| ImportError::SheetReadError("Excel 文件无工作表".to_string()))
}

/// Range 可能不从 A1 开始，补齐空行/空列保证列号与源文件一致
fn range_to_sheet(range: &Range<Data>) -> Sheet {
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut sheet: Sheet = vec![Vec::new(); start_row];
    for data_row in range.rows() {
        let mut row = vec![Cell::Empty; start_col];
        row.extend(data_row.iter().map(convert_cell));
        sheet.push(row);
    }
    sheet
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

// ==========================================
// 通用表格读取器（根据文件头自动选择）
// ==========================================
pub struct UniversalSheetReader;

impl SheetReader for UniversalSheetReader {
    fn read_sheet(&self, bytes: &[u8]) -> ImportResult<Sheet> {
        if bytes.is_empty() {
            return Err(ImportError::EmptyFile("文件内容为空".to_string()));
        }

        if bytes.starts_with(ZIP_MAGIC) {
            ExcelSheetReader {
                kind: ExcelKind::Xlsx,
            }
            .read_sheet(bytes)
        } else if bytes.starts_with(OLE_MAGIC) {
            ExcelSheetReader {
                kind: ExcelKind::Xls,
            }
            .read_sheet(bytes)
        } else if std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)).is_ok() {
            CsvSheetReader.read_sheet(bytes)
        } else {
            Err(ImportError::UnsupportedFormat(
                "无法识别的二进制文件".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_reader_semicolon() {
        let bytes = "Variety;Grade;Stems;Price\nFreedom;60;100;0,45\n".as_bytes();
        let sheet = CsvSheetReader.read_sheet(bytes).unwrap();

        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet[0][0], Cell::Text("Variety".to_string()));
        assert_eq!(sheet[1][3], Cell::Text("0,45".to_string()));
    }

    #[test]
    fn test_csv_reader_keeps_blank_cells_positional() {
        let bytes = b"a,,c\n,,\nx,y\n";
        let sheet = CsvSheetReader.read_sheet(bytes).unwrap();

        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet[0][1], Cell::Empty);
        assert!(sheet[1].iter().all(|c| c.is_blank()));
        assert_eq!(sheet[2].len(), 2);
    }

    #[test]
    fn test_csv_reader_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"Variety,Stems\n");
        let sheet = CsvSheetReader.read_sheet(&bytes).unwrap();
        assert_eq!(sheet[0][0], Cell::Text("Variety".to_string()));
    }

    #[test]
    fn test_universal_reader_rejects_empty_and_binary() {
        assert!(matches!(
            UniversalSheetReader.read_sheet(b""),
            Err(ImportError::EmptyFile(_))
        ));
        assert!(matches!(
            UniversalSheetReader.read_sheet(&[0xFF, 0xFE, 0x00, 0x81]),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_universal_reader_bad_xlsx() {
        // ZIP 头但内容损坏
        let result = UniversalSheetReader.read_sheet(b"PK\x03\x04garbage");
        assert!(matches!(result, Err(ImportError::SheetReadError(_))));
    }
}
