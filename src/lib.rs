//! qogita2oblio - Qogita invoice export to Oblio import converter
//!
//! Qogitaの請求書エクスポート（.xlsx/.xls）を解析し、会計システムOblioが
//! 取り込める固定27列形式のスプレッドシートを2種類生成するクレート。
//!
//! - **firma 1**: 元のEUR単価をそのまま出力
//! - **firma 2**: RONへ換算し、固定アドオス（adaos、マークアップ）を
//!   各商品の換算後価値の比率で按分した単価を出力
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use qogita2oblio::{reader, service};
//!
//! fn main() -> Result<(), qogita2oblio::ConvertError> {
//!     let input = File::open("factura.xlsx")?;
//!     let grid = reader::read_grid(input)?;
//!
//!     // markup 10 RON, exchange rate 5.00 RON/EUR
//!     let conversion = service::convert(&grid, 10.0, 5.0)?;
//!
//!     std::fs::write("oblio_firma1.xlsx", &conversion.firma1.document)?;
//!     if let Some(firma2) = &conversion.firma2 {
//!         std::fs::write("oblio_firma2.xlsx", &firma2.branch.document)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! HTTPバウンダリ（アップロードフォーム、`POST /convert`、
//! `GET /download/{filename}`）は[`web`]モジュールが提供します。
//! コアパイプライン（[`locator`] → [`extractor`] → [`distributor`] →
//! [`emitter`]）はファイルシステムに触れない純粋な関数群です。

pub mod distributor;
pub mod emitter;
pub mod error;
pub mod extractor;
pub mod locator;
pub mod reader;
pub mod service;
pub mod storage;
pub mod types;
pub mod web;

// 公開API
pub use error::ConvertError;
pub use service::{Branch, Conversion};
pub use types::{CellValue, HeaderLocation, InvoiceMetadata, Product, RawGrid};
