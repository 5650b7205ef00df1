//! Reader Module
//!
//! calamineを使用した入力スプレッドシート読み込みの実装。
//! 最初のシートのみを対象とし、セル値を[`CellValue`]のグリッドへ正規化します。

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::{Cursor, Read};

use crate::error::ConvertError;
use crate::types::{CellValue, RawGrid};

/// 入力スプレッドシートの最初のシートをグリッドとして読み込む
///
/// 入力は一度メモリ上のバッファへ読み切ってから解析します
/// （calamineの自動判別は`Clone`可能なシーク対象を要求するため、
/// `Cursor<Vec<u8>>`に載せ替えます）。`.xlsx`と`.xls`（レガシーBIFF）の
/// 両方を`open_workbook_auto_from_rs`で自動判別します。グリッドは
/// 使用範囲（used range）から始まるため、先頭の完全な空行・空列は
/// 含まれませんが、ヘッダー位置は内容で特定するので影響しません。
///
/// # 引数
///
/// * `input` - スプレッドシートを読み込むリーダー（Readトレイトを実装）
///
/// # 戻り値
///
/// * `Ok(RawGrid)` - 行ごとのセル値（範囲内は密で、短い行はない）
/// * `Err(ConvertError::Parse)` - ファイルが壊れている・形式不明の場合
/// * `Err(ConvertError::NoSheet)` - ワークブックにシートがない場合
///
/// # 使用例
///
/// ```rust,no_run
/// use std::fs::File;
/// use qogita2oblio::reader;
///
/// # fn main() -> Result<(), qogita2oblio::ConvertError> {
/// let grid = reader::read_grid(File::open("factura.xlsx")?)?;
/// println!("{} randuri", grid.len());
/// # Ok(())
/// # }
/// ```
pub fn read_grid<R: Read>(mut input: R) -> Result<RawGrid, ConvertError> {
    let mut buffer = Vec::new();
    input.read_to_end(&mut buffer)?;

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(buffer)).map_err(ConvertError::Parse)?;

    // 最初のシートのみを対象とする（マルチシートは対象外）
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ConvertError::NoSheet)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(ConvertError::Parse)?;

    let grid = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    Ok(grid)
}

/// calamineのセル値を正規化する
///
/// 日付セルは`YYYY-MM-DD`形式の文字列へ変換します（請求書日付の
/// メタデータ行がExcel日付で来る場合があるため）。
fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => CellValue::String(datetime.format("%Y-%m-%d").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn test_convert_cell_numbers() {
        assert_eq!(convert_cell(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(convert_cell(&Data::Float(10.5)), CellValue::Number(10.5));
    }

    #[test]
    fn test_convert_cell_text_and_empty() {
        assert_eq!(
            convert_cell(&Data::String("Name".to_string())),
            CellValue::String("Name".to_string())
        );
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(convert_cell(&Data::Bool(true)), CellValue::Bool(true));
    }

    #[test]
    fn test_convert_cell_error() {
        assert_eq!(
            convert_cell(&Data::Error(CellErrorType::Div0)),
            CellValue::Error(CellErrorType::Div0.to_string())
        );
    }

    #[test]
    fn test_read_grid_rejects_invalid_input() {
        let invalid: Vec<u8> = vec![0x00, 0x01, 0x02];
        let result = read_grid(std::io::Cursor::new(invalid));
        assert!(result.is_err());
    }

    #[test]
    fn test_read_grid_from_plain_file_handle() {
        // FileはCloneできないリーダーの代表例（バッファリング経由で読めること）
        let mut workbook = rust_xlsxwriter::Workbook::new();
        workbook
            .add_worksheet()
            .write_string(0, 0, "Name")
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factura.xlsx");
        workbook.save(&path).unwrap();

        let grid = read_grid(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(grid[0][0], CellValue::String("Name".to_string()));
    }
}
