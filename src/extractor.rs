//! Product Extractor Module
//!
//! 特定済みヘッダー行の下から商品テーブルを抽出するモジュール。
//! 列は固定インデックスではなくラベル解決済みの[`HeaderLocation`]で
//! 参照するため、列の並び替えに影響されません。

use crate::types::{CellValue, HeaderLocation, Product};

/// 商品テーブル終端のフッター行（コピーライト表記）の一致候補
///
/// Qogitaのエクスポートは最終行にコピーライト行を置くことがあります。
/// 文字化けした形（`Â©`）は、Latin-1として再解釈されたUTF-8を持つ
/// エクスポートで実際に観測されるため、両方を受け付けます。
pub const FOOTER_SENTINELS: [&str; 2] = ["© 2025 Qogita.", "Â© 2025 Qogita."];

/// ヘッダー行より下のすべての行から商品レコードを抽出する
///
/// 行ごとの処理:
///
/// 1. 名前列のセルが空、または第1セルがフッター行の場合はスキップ
/// 2. 数値フィールドは解釈失敗時に0へフォールバック
///    （単価は小数、数量は整数、TVA率は`Rate`列から小数）
/// 3. 名前が非空かつ数量が正でu32に収まる行のみレコード化
///    （それ以外は黙って除外）
///
/// TVA率を`VAT`列ではなく`Rate`列から読むのは仕様通りです。
/// リバースチャージ取引では`VAT`が0でも`Rate`に正しい率が入るためです。
///
/// # 戻り値
///
/// 抽出されたレコード列（空になり得る — 空の場合の失敗判定は
/// 呼び出し側のConversionServiceが行います）
pub fn extract(grid: &[Vec<CellValue>], location: &HeaderLocation) -> Vec<Product> {
    let mut products = Vec::new();

    for row in grid.iter().skip(location.row + 1) {
        if is_skipped(row, location) {
            continue;
        }

        let name = cell(row, location.name_col).as_text();
        let cod = cell(row, location.gtin_col).as_text();
        let pret = cell(row, location.price_col).parse_f64_or(0.0);
        let cota_tva = match location.rate_col {
            Some(rate_col) => cell(row, rate_col).parse_f64_or(0.0),
            None => 0.0,
        };

        // u32に収まらない数量は0数量と同じ扱いで行ごと除外する
        let cantitate = u32::try_from(cell(row, location.quantity_col).parse_i64_or(0))
            .ok()
            .filter(|quantity| *quantity > 0);

        if let Some(cantitate) = cantitate {
            if !name.is_empty() {
                products.push(Product::new(name, cod, cantitate, pret, cota_tva));
            }
        }
    }

    products
}

/// 行が抽出対象外かどうかを判定する
fn is_skipped(row: &[CellValue], location: &HeaderLocation) -> bool {
    if cell(row, location.name_col).is_empty() {
        return true;
    }
    if let Some(CellValue::String(first)) = row.first() {
        if FOOTER_SENTINELS.contains(&first.as_str()) {
            return true;
        }
    }
    false
}

/// 行から指定列のセルを取得する（短い行は空セル扱い）
fn cell(row: &[CellValue], col: usize) -> &CellValue {
    row.get(col).unwrap_or(&CellValue::Empty)
}
