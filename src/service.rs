//! Conversion Service Module
//!
//! パイプライン全体（locate → extract → emit / distribute → emit）を
//! 順に実行し、レスポンスサマリーを構築するファサード。
//! ファイルの保存やHTTPの詳細は[`crate::web`]と[`crate::storage`]が担い、
//! このモジュールはグリッドとバイト列のみを扱います。

use serde::Serialize;

use crate::distributor;
use crate::emitter;
use crate::error::ConvertError;
use crate::extractor;
use crate::locator;
use crate::types::{Product, RawGrid};

/// プレビューで商品名を切り詰める長さ（文字数）
const PREVIEW_NAME_LIMIT: usize = 50;

/// firma 2の通貨ラベル（固定）
pub const TARGET_CURRENCY: &str = "RON";

/// プレビュー用の商品サマリー
///
/// 名前は50文字で切り詰められ、切り詰めた場合のみ`...`が付きます。
/// 切り詰めは表示専用で、生成されるドキュメントには影響しません。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPreview {
    pub denumire: String,
    pub cod: String,
    pub cantitate: u32,
    pub pret: f64,
}

/// 1ブランチ分の変換結果（合計値、レコード、生成済みドキュメント）
#[derive(Debug, Clone)]
pub struct Branch {
    /// 合計価値（Σ 単価 × 数量）
    pub total_value: f64,

    /// このブランチのレコード列
    pub products: Vec<Product>,

    /// 生成済みワークブックのバイト列
    pub document: Vec<u8>,
}

impl Branch {
    /// プレビュー用のレコード列を構築する
    pub fn previews(&self) -> Vec<ProductPreview> {
        self.products
            .iter()
            .map(|product| ProductPreview {
                denumire: truncate_name(&product.denumire),
                cod: product.cod.clone(),
                cantitate: product.cantitate,
                pret: product.pret,
            })
            .collect()
    }
}

/// firma 2ブランチ（換算 + アドオス按分）の結果
#[derive(Debug, Clone)]
pub struct ConvertedBranch {
    /// 按分された固定アドオス（RON）
    pub markup: f64,

    /// 適用した為替レート
    pub exchange_rate: f64,

    /// ブランチ本体
    pub branch: Branch,
}

/// 1回の変換リクエストの結果全体
///
/// リクエストスコープの値オブジェクトで、レスポンス生成後は
/// ドキュメントバイト列以外に何も残りません。
#[derive(Debug, Clone)]
pub struct Conversion {
    /// 請求書ID（空になり得る）
    pub invoice_id: String,

    /// 請求書日付（空になり得る）
    pub invoice_date: String,

    /// 抽出された商品数
    pub products_count: usize,

    /// firma 1ブランチ（元のEUR単価）
    pub firma1: Branch,

    /// firma 2ブランチ（`exchange_rate > 0`の場合のみ）
    pub firma2: Option<ConvertedBranch>,
}

/// グリッドに対して変換パイプラインを実行する
///
/// # 処理フロー
///
/// 1. ヘッダー行の特定とメタデータ抽出
/// 2. 商品抽出（0件なら`NoProducts`）
/// 3. 元の合計価値を計算し、firma 1ドキュメントを生成
/// 4. `exchange_rate > 0`の場合のみ、按分 → firma 2ドキュメントを生成
///
/// # 引数
///
/// * `grid` - 入力グリッド（このリクエストが排他所有）
/// * `markup` - 按分する固定RON額（デフォルト0）
/// * `exchange_rate` - EUR→RON乗数（0以下ならfirma 2を生成しない）
///
/// # 使用例
///
/// ```rust
/// use qogita2oblio::{service, CellValue};
///
/// let text = |s: &str| CellValue::String(s.to_string());
/// let grid = vec![
///     vec![text("Invoice ID"), text("INV-1")],
///     vec![text("Name"), text("GTIN"), text("Price"), text("Quantity")],
///     vec![text("Widget"), text("123"), CellValue::Number(10.0), CellValue::Number(2.0)],
/// ];
/// let conversion = service::convert(&grid, 0.0, 0.0).unwrap();
/// assert_eq!(conversion.products_count, 1);
/// assert!(conversion.firma2.is_none());
/// ```
pub fn convert(
    grid: &RawGrid,
    markup: f64,
    exchange_rate: f64,
) -> Result<Conversion, ConvertError> {
    // 1. ヘッダー特定とメタデータ
    let location = locator::locate(grid)?;
    let metadata = locator::invoice_metadata(grid, location.row);

    // 2. 商品抽出
    let products = extractor::extract(grid, &location);
    if products.is_empty() {
        return Err(ConvertError::NoProducts);
    }

    // 3. firma 1（元単価）
    let total_value: f64 = products.iter().map(Product::value).sum();
    let document1 = emitter::emit(&products)?;
    let products_count = products.len();
    let firma1 = Branch {
        total_value,
        products,
        document: document1,
    };

    // 4. firma 2（換算 + アドオス）
    let firma2 = if exchange_rate > 0.0 {
        let converted = distributor::distribute(&firma1.products, exchange_rate, markup)?;
        let total_converted: f64 = converted.iter().map(Product::value).sum();
        let document2 = emitter::emit(&converted)?;
        Some(ConvertedBranch {
            markup,
            exchange_rate,
            branch: Branch {
                total_value: total_converted,
                products: converted,
                document: document2,
            },
        })
    } else {
        None
    };

    Ok(Conversion {
        invoice_id: metadata.invoice_id,
        invoice_date: metadata.invoice_date,
        products_count,
        firma1,
        firma2,
    })
}

/// プレビュー用に商品名を50文字へ切り詰める
///
/// 50文字を超える場合のみ先頭50文字 + `...`。文字境界で切るため、
/// マルチバイト名でもパニックしません。
fn truncate_name(name: &str) -> String {
    if name.chars().count() > PREVIEW_NAME_LIMIT {
        let truncated: String = name.chars().take(PREVIEW_NAME_LIMIT).collect();
        format!("{}...", truncated)
    } else {
        name.to_string()
    }
}
