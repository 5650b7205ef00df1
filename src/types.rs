//! Types Module
//!
//! クレート全体で使用する共通データ型と、明示的デフォルト付きの
//! 数値強制変換ヘルパーを定義するモジュール。

use serde::Serialize;

/// 入力グリッド全体（行のシーケンスの中に異種セル値のシーケンス）
///
/// 1回の変換リクエストが排他的に所有し、リクエスト完了後に破棄されます。
pub type RawGrid = Vec<Vec<CellValue>>;

/// 単位の固定値（bucata = 個）
pub const UNIT_BUCATA: &str = "buc";

/// 「TVA込みか」フラグの固定値（NU = 含まない）
pub const VAT_NOT_INCLUDED: &str = "NU";

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    ///
    /// 空文字列のセルも空として扱います（Qogitaのエクスポートは
    /// 区切り行を空文字列で埋めることがあるため）。
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// セルが指定ラベルと完全一致する文字列かどうかを判定
    pub fn is_label(&self, label: &str) -> bool {
        matches!(self, CellValue::String(s) if s == label)
    }

    /// 値を文字列として取得（書式適用なし）
    ///
    /// GTINのような数値セルは整数表記に強制します
    /// （`4061856161068.0`ではなく`4061856161068`）。
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }

    /// 値を小数として解釈し、失敗時は明示的なデフォルト値を返す
    ///
    /// # 引数
    ///
    /// * `default` - 解釈できない場合に返す値（呼び出し側で可視）
    pub fn parse_f64_or(&self, default: f64) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::String(s) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// 値を整数として解釈し、失敗時は明示的なデフォルト値を返す
    ///
    /// 数値セルと小数表記の文字列は0方向へ切り捨てます
    /// （`2.9` → `2`）。
    pub fn parse_i64_or(&self, default: i64) -> i64 {
        match self {
            CellValue::Number(n) => n.trunc() as i64,
            CellValue::String(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.trunc() as i64))
                    .unwrap_or(default)
            }
            _ => default,
        }
    }
}

/// ヘッダー行の位置と、ラベルごとの列インデックス
///
/// 必須ラベル（`Name`/`GTIN`/`Price`/`Quantity`）はすべて解決済みで
/// なければ生成されません。`VAT`/`Rate`は任意で、欠けていても
/// エラーにはなりません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLocation {
    /// ヘッダー行のインデックス（0始まり）
    pub row: usize,

    /// `Name`列のインデックス
    pub name_col: usize,

    /// `GTIN`列のインデックス
    pub gtin_col: usize,

    /// `Price`列のインデックス
    pub price_col: usize,

    /// `Quantity`列のインデックス
    pub quantity_col: usize,

    /// `VAT`列のインデックス（任意）
    pub vat_col: Option<usize>,

    /// `Rate`列のインデックス（任意、リバースチャージ時のTVA率）
    pub rate_col: Option<usize>,
}

/// ヘッダー行より上から抽出した請求書メタデータ
///
/// どちらのフィールドも空文字列になり得ます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceMetadata {
    /// 請求書ID（`Invoice ID`行の2列目）
    pub invoice_id: String,

    /// 請求書日付（`Date`行の2列目）
    pub invoice_date: String,
}

/// 正規化済みの商品レコード（Oblioスキーマのフィールド名）
///
/// 抽出時に`cantitate > 0`かつ`denumire`非空の行のみ生成されます。
/// firma 2ブランチでは`pret`のみ再計算した複製が作られ、それ以外の
/// フィールドは変化しません。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    /// 商品名（Denumire produs）
    pub denumire: String,

    /// 商品コード＝GTIN（Cod produs）
    pub cod: String,

    /// 単位（U.M.、固定で`buc`）
    pub um: String,

    /// 数量（Cantitate、正の整数のみ）
    pub cantitate: u32,

    /// 仕入単価（Pret achizitie）
    pub pret: f64,

    /// TVA率（Cota TVA）
    pub cota_tva: f64,

    /// TVA込みフラグ（TVA inclus、固定で`NU`）
    pub tva_inclus: String,
}

impl Product {
    /// 固定フィールドを埋めた新しい商品レコードを生成
    pub fn new(denumire: String, cod: String, cantitate: u32, pret: f64, cota_tva: f64) -> Self {
        Self {
            denumire,
            cod,
            um: UNIT_BUCATA.to_string(),
            cantitate,
            pret,
            cota_tva,
            tva_inclus: VAT_NOT_INCLUDED.to_string(),
        }
    }

    /// 行の価値（単価 × 数量）
    pub fn value(&self) -> f64 {
        self.pret * f64::from(self.cantitate)
    }

    /// 単価のみ差し替えた複製を生成
    pub fn with_pret(&self, pret: f64) -> Self {
        Self {
            pret,
            ..self.clone()
        }
    }
}
