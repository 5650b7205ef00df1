//! Web Boundary Tests for qogita2oblio
//!
//! axumルーターをtowerの`oneshot`で直接駆動し、multipart境界の
//! 受理・拒否とアップロード掃除をHTTPレベルで検証する。

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rust_xlsxwriter::Workbook;
use std::sync::Arc;
use tower::ServiceExt;

use qogita2oblio::storage::FileStore;
use qogita2oblio::web::{self, AppState};

const BOUNDARY: &str = "qogita-form-boundary";

fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    let app = web::router(Arc::new(AppState { store }));
    (app, dir)
}

/// ヘッダー1行 + 商品1行の最小の有効な請求書
fn valid_invoice() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Invoice ID").unwrap();
    worksheet.write_string(0, 1, "INV-1").unwrap();
    worksheet.write_string(1, 0, "Name").unwrap();
    worksheet.write_string(1, 1, "GTIN").unwrap();
    worksheet.write_string(1, 2, "Price").unwrap();
    worksheet.write_string(1, 3, "Quantity").unwrap();
    worksheet.write_string(2, 0, "Widget").unwrap();
    worksheet.write_string(2, 1, "123456").unwrap();
    worksheet.write_number(2, 2, 10.0).unwrap();
    worksheet.write_number(2, 3, 2.0).unwrap();
    workbook.save_to_buffer().unwrap()
}

/// ヘッダー行を持たない（変換が拒否される）ワークブック
fn invoice_without_header() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Lista de cumparaturi").unwrap();
    workbook.save_to_buffer().unwrap()
}

/// `POST /convert`のmultipartリクエストを組み立てる
///
/// `parts`の各要素は (フィールド名, ファイル名, 内容)。ファイル名が
/// `None`のフィールドはテキストフィールドとして書き出す。
fn convert_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn stored_names(dir: &tempfile::TempDir) -> Vec<String> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test]
async fn pdf_upload_is_rejected_before_parsing() {
    let (app, dir) = test_app();

    // 内容は有効なワークブックでも、拡張子だけで拒否される
    let request = convert_request(&[("factura", Some("factura.pdf"), &valid_invoice())]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = json_body(response).await;
    assert_eq!(
        payload["error"],
        "Doar fisiere Excel (.xlsx, .xls) sunt acceptate"
    );
    // 解析前拒否なので何も保存されない
    assert!(stored_names(&dir).is_empty());
}

#[tokio::test]
async fn request_without_file_is_rejected() {
    let (app, _dir) = test_app();

    let request = convert_request(&[("markup", None, b"10")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = json_body(response).await;
    assert_eq!(payload["error"], "Nu a fost incarcat niciun fisier");
}

#[tokio::test]
async fn convert_round_trip_over_http() {
    let (app, dir) = test_app();

    let request = convert_request(&[
        ("factura", Some("factura.xlsx"), &valid_invoice()),
        ("markup", None, b"10"),
        ("exchangeRate", None, b"5"),
    ]);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payload = json_body(response).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["invoiceId"], "INV-1");
    assert_eq!(payload["productsCount"], 1);
    assert_eq!(payload["firma1"]["totalValue"], "20.00");
    assert_eq!(payload["firma2"]["totalValue"], "110.00");

    // アップロードの複製は削除済みで、残るのは生成ドキュメントのみ
    let names = stored_names(&dir);
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|name| name.starts_with("oblio_firma")));

    // 生成ドキュメントはdownloadUrlから取得できる
    let url = payload["firma1"]["downloadUrl"].as_str().unwrap().to_string();
    let download = app
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(
        download.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let document = to_bytes(download.into_body(), usize::MAX).await.unwrap();
    assert!(!document.is_empty());
}

#[tokio::test]
async fn failed_conversion_leaves_no_upload_behind() {
    let (app, dir) = test_app();

    let request = convert_request(&[("factura", Some("factura.xlsx"), &invoice_without_header())]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = json_body(response).await;
    assert_eq!(
        payload["error"],
        "Format invalid - nu am gasit header-ul cu produse (Name, GTIN, Price, Quantity)"
    );
    // 失敗時もアップロードの複製は残らない
    assert!(stored_names(&dir).is_empty());
}

#[tokio::test]
async fn download_of_unknown_file_is_not_found() {
    let (app, _dir) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/download/lipsa.xlsx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = json_body(response).await;
    assert_eq!(payload["error"], "Fisierul nu a fost gasit");
}
