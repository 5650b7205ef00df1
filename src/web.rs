//! Web Boundary Module
//!
//! axumベースのHTTPバウンダリ。アップロードフォームの配信、
//! `POST /convert`（multipart）、`GET /download/{filename}`を提供します。
//! 変換の実体は[`crate::service`]で、ここは薄いI/O配管のみです。

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::error::ConvertError;
use crate::reader;
use crate::service::{self, ProductPreview};
use crate::storage::{self, FileStore, REMOVAL_DELAY};

/// アップロードの上限サイズ
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// 為替レートのデフォルト（フィールド欠損・解釈不能時のみ）
const DEFAULT_EXCHANGE_RATE: f64 = 5.00;

/// 生成ドキュメントのMIMEタイプ
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// 共有アプリケーション状態
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: FileStore,
}

/// ルーターを構築する
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/convert",
            post(convert_invoice).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/download/{filename}", get(download))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../public/index.html"))
}

#[derive(Debug, Serialize)]
struct ConvertResponse {
    success: bool,
    #[serde(rename = "invoiceId")]
    invoice_id: String,
    #[serde(rename = "invoiceDate")]
    invoice_date: String,
    #[serde(rename = "productsCount")]
    products_count: usize,
    firma1: FirmaBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    firma2: Option<Firma2Block>,
}

#[derive(Debug, Serialize)]
struct FirmaBlock {
    #[serde(rename = "totalValue")]
    total_value: String,
    #[serde(rename = "downloadUrl")]
    download_url: String,
    products: Vec<ProductPreview>,
}

#[derive(Debug, Serialize)]
struct Firma2Block {
    markup: f64,
    #[serde(rename = "exchangeRate")]
    exchange_rate: f64,
    currency: String,
    #[serde(rename = "totalValue")]
    total_value: String,
    #[serde(rename = "downloadUrl")]
    download_url: String,
    products: Vec<ProductPreview>,
}

/// `POST /convert` - 請求書1件を変換する
///
/// multipartフィールド: `factura`（ファイル）、`markup`、`exchangeRate`。
/// アップロードされた入力アーティファクトは成功・失敗を問わず削除されます。
async fn convert_invoice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, Response> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut markup_field: Option<String> = None;
    let mut rate_field: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| error_response(StatusCode::BAD_REQUEST, err.to_string()))?
    {
        match field.name().unwrap_or("") {
            "factura" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| error_response(StatusCode::BAD_REQUEST, err.to_string()))?;
                upload = Some((filename, bytes.to_vec()));
            }
            "markup" => {
                markup_field = field.text().await.ok();
            }
            "exchangeRate" => {
                rate_field = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (original_name, bytes) = upload.ok_or_else(|| convert_error(&ConvertError::NoFilePresent))?;

    // 解析前の拡張子チェック
    if !storage::has_excel_extension(&original_name) {
        return Err(convert_error(&ConvertError::InvalidFileType(original_name)));
    }

    let markup = parse_param(markup_field.as_deref(), 0.0);
    let exchange_rate = parse_param(rate_field.as_deref(), DEFAULT_EXCHANGE_RATE);

    // 入力アーティファクトを保存し、結果に関わらず必ず削除する
    // （保存自体が失敗した場合も、部分書き込みを残さないよう削除する）
    let upload_name = upload_artifact_name(&original_name);
    let result = match state.store.store(&upload_name, &bytes).await {
        Ok(()) => run_pipeline(&state, &bytes, markup, exchange_rate).await,
        Err(err) => Err(err),
    };
    state.store.remove(&upload_name).await;

    match result {
        Ok(response) => {
            tracing::info!(
                invoice_id = %response.invoice_id,
                products_count = response.products_count,
                firma2 = response.firma2.is_some(),
                "invoice converted"
            );
            Ok(Json(response))
        }
        Err(err) => {
            tracing::warn!(%err, "conversion failed");
            Err(convert_error(&err))
        }
    }
}

/// パイプライン実行とドキュメント保存
async fn run_pipeline(
    state: &Arc<AppState>,
    bytes: &[u8],
    markup: f64,
    exchange_rate: f64,
) -> Result<ConvertResponse, ConvertError> {
    let grid = reader::read_grid(Cursor::new(bytes.to_vec()))?;
    let conversion = service::convert(&grid, markup, exchange_rate)?;

    let name_stub = document_name_stub(&conversion.invoice_id);

    let filename1 = format!("oblio_firma1_{}.xlsx", name_stub);
    state
        .store
        .store(&filename1, &conversion.firma1.document)
        .await?;

    let firma2 = match &conversion.firma2 {
        Some(converted) => {
            let filename2 = format!("oblio_firma2_{}.xlsx", name_stub);
            state
                .store
                .store(&filename2, &converted.branch.document)
                .await?;
            Some(Firma2Block {
                markup: converted.markup,
                exchange_rate: converted.exchange_rate,
                currency: service::TARGET_CURRENCY.to_string(),
                total_value: format!("{:.2}", converted.branch.total_value),
                download_url: format!("/download/{}", filename2),
                products: converted.branch.previews(),
            })
        }
        None => None,
    };

    Ok(ConvertResponse {
        success: true,
        invoice_id: conversion.invoice_id.clone(),
        invoice_date: conversion.invoice_date.clone(),
        products_count: conversion.products_count,
        firma1: FirmaBlock {
            total_value: format!("{:.2}", conversion.firma1.total_value),
            download_url: format!("/download/{}", filename1),
            products: conversion.firma1.previews(),
        },
        firma2,
    })
}

/// `GET /download/{filename}` - 生成ドキュメントを1回配信する
///
/// 配信開始と同時に固定遅延の削除タイマーを起動します。削除と競合した
/// 2回目のダウンロードは404になり得ます（ロックは持ちません）。
async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, Response> {
    // パス区切りを含む名前はトラバーサルとして存在しない扱い
    let valid = storage::sanitize_name(&filename)
        .map(|sanitized| sanitized == filename)
        .unwrap_or(false);
    if !valid {
        return Err(convert_error(&ConvertError::ArtifactNotFound(filename)));
    }

    let file = state
        .store
        .open(&filename)
        .await
        .map_err(|err| convert_error(&err))?;

    state.store.schedule_removal(&filename, REMOVAL_DELAY);

    let stream = ReaderStream::new(file);
    let mut response = Response::new(Body::from_stream(stream));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(XLSX_CONTENT_TYPE),
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// 数値パラメータを解釈する（欠損・解釈不能ならデフォルト）
fn parse_param(value: Option<&str>, default: f64) -> f64 {
    value
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|parsed| parsed.is_finite())
        .unwrap_or(default)
}

/// アップロード入力の保存名（タイムスタンプ + 元のファイル名）
fn upload_artifact_name(original_name: &str) -> String {
    let base = storage::sanitize_name(original_name).unwrap_or_else(|| "factura.xlsx".to_string());
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), base)
}

/// 生成ドキュメント名の共通部分（請求書ID + 衝突しないUUID）
fn document_name_stub(invoice_id: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match storage::sanitize_name(invoice_id) {
        Some(id) if !id.is_empty() => format!("{}_{}", id, token),
        _ => token,
    }
}

/// ConvertErrorをHTTPレスポンスへ写像する
fn convert_error(err: &ConvertError) -> Response {
    let status = match err {
        ConvertError::ArtifactNotFound(_) => StatusCode::NOT_FOUND,
        ConvertError::Io(_) | ConvertError::Parse(_) | ConvertError::Write(_) => {
            tracing::error!(%err, "processing failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, err.user_message())
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
