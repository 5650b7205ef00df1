//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// qogita2oblioクレート全体で使用するエラー型
///
/// 請求書ファイルの読み込み、テーブル解析、換算計算、出力生成の
/// すべての段階で発生するエラーを統一的に扱います。いずれのエラーも
/// リクエストに対して終端的であり、リトライや部分的な結果は生成されません。
///
/// # エラーの種類
///
/// - `Io` / `Parse` / `Write`: 入出力と基盤ライブラリ由来のエラー
/// - `InvalidFileType` / `NoFilePresent`: 解析開始前に拒否される入力
/// - `HeaderNotFound` / `NoProducts` / `ZeroTotalValue`: パイプライン固有の失敗
/// - `ArtifactNotFound`: 生成済みドキュメントの取得失敗（期限切れ・削除済み）
///
/// # 使用例
///
/// ```rust,no_run
/// use qogita2oblio::ConvertError;
/// use std::fs::File;
///
/// fn open_invoice(path: &str) -> Result<(), ConvertError> {
///     let _file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum ConvertError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 入力スプレッドシートの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    /// 出力スプレッドシートの生成中に発生したエラー（rust_xlsxwriter由来）
    #[error("Failed to write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// 拡張子が`.xlsx`/`.xls`以外のファイルがアップロードされた
    ///
    /// ファイル名の拡張子のみで判定し、解析を始める前に拒否します。
    #[error("Unsupported file extension: {0:?}")]
    InvalidFileType(String),

    /// リクエストにファイルが含まれていなかった
    #[error("No file present in the request")]
    NoFilePresent,

    /// ワークブックにシートが1枚も存在しなかった
    #[error("Workbook contains no sheets")]
    NoSheet,

    /// ヘッダー行（`Name` + `GTIN`/`Price`/`Quantity`）が見つからなかった
    ///
    /// グリッド全行を走査しても一致する行がなかった場合に発生します。
    #[error("Header row with Name/GTIN/Price/Quantity not found")]
    HeaderNotFound,

    /// ヘッダー行は存在したが、有効な商品行が1件も抽出できなかった
    ///
    /// `HeaderNotFound`とは区別される失敗です。名前が空、または数量が
    /// 0以下の行はすべて抽出時に除外されるため、除外の結果として
    /// 空になった場合もこのエラーになります。
    #[error("No product rows survived extraction")]
    NoProducts,

    /// 換算後の合計価値が0のままアドオス按分が要求された
    ///
    /// 全商品の価格が0の請求書に対する按分は重みが定義できないため、
    /// NaNを伝播させる代わりにリクエストを拒否します。
    #[error("Total converted value is zero; markup cannot be distributed")]
    ZeroTotalValue,

    /// 存在しない、または削除済みの生成ドキュメントが要求された
    #[error("Generated document not found: {0:?}")]
    ArtifactNotFound(String),
}

impl ConvertError {
    /// オペレータ向けのルーマニア語メッセージを返す
    ///
    /// HTTPレスポンスの`error`フィールドにそのまま格納される文字列です。
    /// 内部的な`Io`/`Parse`/`Write`エラーは詳細を付けた汎用メッセージに
    /// 丸められます。
    pub fn user_message(&self) -> String {
        match self {
            ConvertError::InvalidFileType(_) => {
                "Doar fisiere Excel (.xlsx, .xls) sunt acceptate".to_string()
            }
            ConvertError::NoFilePresent => "Nu a fost incarcat niciun fisier".to_string(),
            ConvertError::NoSheet => "Fisierul nu contine nicio foaie de calcul".to_string(),
            ConvertError::HeaderNotFound => {
                "Format invalid - nu am gasit header-ul cu produse (Name, GTIN, Price, Quantity)"
                    .to_string()
            }
            ConvertError::NoProducts => "Nu am gasit produse in factura".to_string(),
            ConvertError::ZeroTotalValue => {
                "Valoarea totala a produselor este zero - nu se poate distribui adaosul"
                    .to_string()
            }
            ConvertError::ArtifactNotFound(_) => "Fisierul nu a fost gasit".to_string(),
            other => format!("Eroare la procesare: {}", other),
        }
    }

    /// 解析・計算段階より前に拒否されたエラーかどうか
    pub fn is_rejected_before_parsing(&self) -> bool {
        matches!(
            self,
            ConvertError::InvalidFileType(_) | ConvertError::NoFilePresent
        )
    }
}
