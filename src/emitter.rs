//! Sheet Emitter Module
//!
//! 商品レコード列をOblioが要求する固定27列スキーマのワークブックへ
//! シリアライズするモジュール。rust_xlsxwriterでメモリ上のバッファに
//! 書き出し、ファイルシステムには触れません。

use rust_xlsxwriter::{Format, Workbook};

use crate::error::ConvertError;
use crate::types::Product;

/// Oblioの取り込みが要求する総列数（使用は先頭7列のみ）
pub const OBLIO_COLUMN_COUNT: u16 = 27;

/// 先頭7列のヘッダーラベル
pub const OBLIO_HEADER: [&str; 7] = [
    "Denumire produs",
    "Cod produs",
    "U.M.",
    "Cantitate",
    "Pret achizitie",
    "Cota TVA",
    "TVA inclus",
];

/// 先頭7列の表示幅ヒント（文字単位、装飾のみ）
pub const OBLIO_COLUMN_WIDTHS: [f64; 7] = [60.0, 15.0, 6.0, 10.0, 15.0, 10.0, 10.0];

/// 出力シート名（固定リテラル）
pub const OBLIO_SHEET_NAME: &str = "sheet 1";

/// 商品レコード列をOblio形式のワークブックバイト列に変換する
///
/// 出力スキーマ:
///
/// - ヘッダー行: 7個のラベル + 20個の空プレースホルダ（計27列）
/// - 商品行: レコードの値をそのまま7列 + 20個の空セル
/// - 終端行: 27列すべて空の行1つ（取り込み側の終端規約）
///
/// # 戻り値
///
/// * `Ok(Vec<u8>)` - xlsxワークブックのバイト列
/// * `Err(ConvertError::Write)` - シリアライズに失敗した場合
///
/// # 使用例
///
/// ```rust
/// use qogita2oblio::{emitter, types::Product};
///
/// # fn main() -> Result<(), qogita2oblio::ConvertError> {
/// let products = vec![Product::new(
///     "Widget".to_string(), "123456".to_string(), 2, 10.0, 19.0,
/// )];
/// let document = emitter::emit(&products)?;
/// assert!(!document.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn emit(products: &[Product]) -> Result<Vec<u8>, ConvertError> {
    // 既定フォーマットの空セルはワークブックに保存されないため、
    // 明示的なプロパティを1つ持たせて27列と終端行の実体化を保証する
    // （CalibriはExcelの既定フォントなので見た目は変わらない）
    let blank = Format::new().set_font_name("Calibri");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OBLIO_SHEET_NAME)?;

    // 1. ヘッダー行（7ラベル + 20空）
    for (col, label) in OBLIO_HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *label)?;
    }
    for col in OBLIO_HEADER.len() as u16..OBLIO_COLUMN_COUNT {
        worksheet.write_blank(0, col, &blank)?;
    }

    // 2. 商品行
    for (index, product) in products.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, &product.denumire)?;
        worksheet.write_string(row, 1, &product.cod)?;
        worksheet.write_string(row, 2, &product.um)?;
        worksheet.write_number(row, 3, f64::from(product.cantitate))?;
        worksheet.write_number(row, 4, product.pret)?;
        worksheet.write_number(row, 5, product.cota_tva)?;
        worksheet.write_string(row, 6, &product.tva_inclus)?;
        for col in 7..OBLIO_COLUMN_COUNT {
            worksheet.write_blank(row, col, &blank)?;
        }
    }

    // 3. 終端の全空行
    let last_row = products.len() as u32 + 1;
    for col in 0..OBLIO_COLUMN_COUNT {
        worksheet.write_blank(last_row, col, &blank)?;
    }

    // 4. 表示幅ヒント
    for (col, width) in OBLIO_COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    Ok(workbook.save_to_buffer()?)
}
