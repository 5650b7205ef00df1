//! Markup Distributor Module
//!
//! EUR単価をRONへ換算し、固定アドオス（マークアップ）を各商品の
//! 換算後価値の比率で按分するモジュール。firma 2ブランチ専用で、
//! 為替レートが正の場合にのみ実行されます。

use crate::error::ConvertError;
use crate::types::Product;

/// 通貨の最小単位（2桁小数）へ四捨五入する
///
/// 正の金額に対する標準的なhalf-up丸めです。
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 換算とアドオス按分を適用した商品レコード列を生成する
///
/// 商品ごとの計算:
///
/// 1. `pret_ron = pret * exchange_rate`
/// 2. `valoare_ron = pret_ron * cantitate`
/// 3. `total_ron = (Σ pret * cantitate) * exchange_rate`
/// 4. `pondere = valoare_ron / total_ron`（換算後合計に占める割合）
/// 5. `adaos_produs = markup * pondere`
/// 6. `pret_nou = pret_ron + adaos_produs / cantitate`（2桁へhalf-up丸め）
///
/// 丸め残差の再配分は行わないため、合計は商品ごとの丸めの範囲内で
/// `total_ron + markup`に一致します（許容誤差は商品数 × 0.005）。
///
/// # 引数
///
/// * `products` - 抽出済みレコード列（呼び出し側で非空を保証）
/// * `exchange_rate` - EUR→RON乗数（呼び出し側で正を保証）
/// * `markup` - 按分する固定RON額（0も正当 — 純粋な換算のみ）
///
/// # 戻り値
///
/// * `Ok(Vec<Product>)` - `pret`のみ再計算した複製列
/// * `Err(ConvertError::ZeroTotalValue)` - 換算後合計が0の場合。
///   重みが定義できないため、NaNを伝播させず明示的に拒否します。
pub fn distribute(
    products: &[Product],
    exchange_rate: f64,
    markup: f64,
) -> Result<Vec<Product>, ConvertError> {
    let total_value: f64 = products.iter().map(Product::value).sum();
    let total_ron = total_value * exchange_rate;

    if total_ron <= 0.0 {
        return Err(ConvertError::ZeroTotalValue);
    }

    let converted = products
        .iter()
        .map(|product| {
            let pret_ron = product.pret * exchange_rate;
            let valoare_ron = pret_ron * f64::from(product.cantitate);
            let pondere = valoare_ron / total_ron;
            let adaos_produs = markup * pondere;
            let pret_nou = pret_ron + adaos_produs / f64::from(product.cantitate);
            product.with_pret(round_to_cents(pret_nou))
        })
        .collect();

    Ok(converted)
}
