//! Table Locator Module
//!
//! 位置が固定されていないヘッダー行を内容一致で特定し、その上にある
//! 請求書メタデータ行を抽出するモジュール。抽象的な2次元セル列に対する
//! 純粋関数のみで構成され、スプレッドシートライブラリの型には依存しません。

use crate::error::ConvertError;
use crate::types::{CellValue, HeaderLocation, InvoiceMetadata};

/// ヘッダー行の第1セルが持つべきラベル
pub const LABEL_NAME: &str = "Name";
/// 商品コード列のラベル
pub const LABEL_GTIN: &str = "GTIN";
/// 単価列のラベル
pub const LABEL_PRICE: &str = "Price";
/// 数量列のラベル
pub const LABEL_QUANTITY: &str = "Quantity";
/// TVA列のラベル（任意）
pub const LABEL_VAT: &str = "VAT";
/// TVA率列のラベル（任意、リバースチャージ用）
pub const LABEL_RATE: &str = "Rate";

/// メタデータ行のラベル: 請求書ID
pub const LABEL_INVOICE_ID: &str = "Invoice ID";
/// メタデータ行のラベル: 日付
pub const LABEL_DATE: &str = "Date";

/// グリッドからヘッダー行を特定する
///
/// 上から順に走査し、第1セルが`Name`と完全一致し、かつ行内に`GTIN`・
/// `Price`・`Quantity`が値として含まれる最初の行をヘッダーとします。
/// 各ラベルの列インデックスは、その行内での最初の出現位置です。
/// `VAT`と`Rate`は任意で、欠けていても未解決（`None`）のままになります。
///
/// # 戻り値
///
/// * `Ok(HeaderLocation)` - 必須4ラベルがすべて解決できた場合
/// * `Err(ConvertError::HeaderNotFound)` - 全行を走査しても一致しなかった場合
///
/// # 使用例
///
/// ```rust
/// use qogita2oblio::{locator, CellValue};
///
/// let grid = vec![vec![
///     CellValue::String("Name".to_string()),
///     CellValue::String("GTIN".to_string()),
///     CellValue::String("Price".to_string()),
///     CellValue::String("Quantity".to_string()),
/// ]];
/// let location = locator::locate(&grid).unwrap();
/// assert_eq!(location.row, 0);
/// assert_eq!(location.quantity_col, 3);
/// ```
pub fn locate(grid: &[Vec<CellValue>]) -> Result<HeaderLocation, ConvertError> {
    for (row_index, row) in grid.iter().enumerate() {
        let first_is_name = row.first().is_some_and(|cell| cell.is_label(LABEL_NAME));
        if !first_is_name {
            continue;
        }

        // 必須ラベルはすべて解決できなければヘッダーとみなさない
        let (Some(name_col), Some(gtin_col), Some(price_col), Some(quantity_col)) = (
            find_label(row, LABEL_NAME),
            find_label(row, LABEL_GTIN),
            find_label(row, LABEL_PRICE),
            find_label(row, LABEL_QUANTITY),
        ) else {
            continue;
        };

        return Ok(HeaderLocation {
            row: row_index,
            name_col,
            gtin_col,
            price_col,
            quantity_col,
            vat_col: find_label(row, LABEL_VAT),
            rate_col: find_label(row, LABEL_RATE),
        });
    }

    Err(ConvertError::HeaderNotFound)
}

/// ヘッダー行より上から請求書メタデータを抽出する
///
/// 第1セルが`Invoice ID`または`Date`と一致するすべての行を順に走査し、
/// 2列目の値を対応するフィールドに格納します。重複する場合は走査順に
/// 上書きされるため、最後の一致が勝ちます。一致する行がなければ
/// フィールドは空文字列のままです。
pub fn invoice_metadata(grid: &[Vec<CellValue>], header_row: usize) -> InvoiceMetadata {
    let mut metadata = InvoiceMetadata::default();

    for row in grid.iter().take(header_row) {
        let Some(first) = row.first() else {
            continue;
        };
        if first.is_label(LABEL_INVOICE_ID) {
            metadata.invoice_id = second_cell_text(row);
        }
        if first.is_label(LABEL_DATE) {
            metadata.invoice_date = second_cell_text(row);
        }
    }

    metadata
}

/// 行内でラベルが最初に出現する列インデックスを返す
fn find_label(row: &[CellValue], label: &str) -> Option<usize> {
    row.iter().position(|cell| cell.is_label(label))
}

/// 行の2列目をテキストとして返す（欠損は空文字列）
fn second_cell_text(row: &[CellValue]) -> String {
    row.get(1).map(CellValue::as_text).unwrap_or_default()
}
