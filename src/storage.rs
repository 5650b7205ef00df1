//! File Storage Module
//!
//! アップロード・生成ドキュメントを保持する注入可能なストレージ。
//! コアパイプラインはこのモジュール経由でのみファイルシステムに触れます。

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::error::ConvertError;

/// ダウンロード完了後に削除タイマーを起動するまでの既定遅延
pub const REMOVAL_DELAY: Duration = Duration::from_secs(5);

/// ディレクトリ1つをルートとする単純なファイルストア
///
/// 同時リクエスト間の隔離はファイル名（UUIDサフィックス）のみに
/// 依存します。削除タイマーと競合する2回目のダウンロードは
/// `ArtifactNotFound`になり得ます（仕様上許容される競合）。
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// ルートディレクトリを作成してストアを初期化する
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ConvertError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// ストア内のフルパスを返す
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// バイト列を保存する
    pub async fn store(&self, name: &str, bytes: &[u8]) -> Result<(), ConvertError> {
        let mut file = tokio::fs::File::create(self.path(name)).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    /// 保存済みファイルを読み込み用に開く
    ///
    /// 存在しない・削除済みの場合は`ArtifactNotFound`を返します。
    pub async fn open(&self, name: &str) -> Result<tokio::fs::File, ConvertError> {
        let path = self.path(name);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            _ => return Err(ConvertError::ArtifactNotFound(name.to_string())),
        }
        Ok(tokio::fs::File::open(&path).await?)
    }

    /// ファイルを即時削除する（存在しなくてもエラーにしない）
    pub async fn remove(&self, name: &str) {
        let path = self.path(name);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(?path, %err, "failed to remove stored file");
            }
        }
    }

    /// 一定遅延後にファイルを削除するタイマーを起動する
    ///
    /// ダウンロード済みアーティファクトの掃除用。タスクはデタッチされ、
    /// 削除失敗はログに残すだけです。
    pub fn schedule_removal(&self, name: &str, delay: Duration) {
        let store = self.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(name, "removing downloaded artifact");
            store.remove(&name).await;
        });
    }
}

/// ストアのファイル名として安全な形へ無害化する
///
/// パス区切りや`..`を含む名前を拒否し、英数と`-`/`_`/`.`以外を
/// `_`へ置換します。請求書IDをファイル名に埋め込むときに使います。
pub fn sanitize_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains(':')
    {
        return None;
    }
    let sanitized: String = trimmed
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    Some(sanitized)
}

/// 拡張子がExcelファイルとして受理可能かを判定する
pub fn has_excel_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            lower == "xlsx" || lower == "xls"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.store("a.xlsx", b"continut").await.unwrap();
        let mut file = store.open("a.xlsx").await.unwrap();
        let mut content = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut file, &mut content)
            .await
            .unwrap();
        assert_eq!(content, b"continut");
    }

    #[tokio::test]
    async fn test_open_missing_is_artifact_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        match store.open("lipsa.xlsx").await {
            Err(ConvertError::ArtifactNotFound(name)) => assert_eq!(name, "lipsa.xlsx"),
            other => panic!("expected ArtifactNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.store("b.xlsx", b"x").await.unwrap();
        store.remove("b.xlsx").await;
        store.remove("b.xlsx").await;
        assert!(store.open("b.xlsx").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_removal_deletes_after_delay() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.store("c.xlsx", b"x").await.unwrap();
        store.schedule_removal("c.xlsx", Duration::from_secs(5));

        // タイマー発火前はまだ存在する
        assert!(store.open("c.xlsx").await.is_ok());

        tokio::time::sleep(Duration::from_secs(6)).await;
        // spawnされた削除タスクに実行機会を与える
        let mut removed = false;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if store.open("c.xlsx").await.is_err() {
                removed = true;
                break;
            }
        }
        assert!(removed);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("INV-2025-001"), Some("INV-2025-001".to_string()));
        assert_eq!(sanitize_name("a b/c"), None);
        assert_eq!(sanitize_name("..\\x"), None);
        assert_eq!(sanitize_name(".."), None);
        assert_eq!(sanitize_name(""), None);
        assert_eq!(sanitize_name("factura nr 5"), Some("factura_nr_5".to_string()));
    }

    #[test]
    fn test_has_excel_extension() {
        assert!(has_excel_extension("factura.xlsx"));
        assert!(has_excel_extension("factura.XLS"));
        assert!(!has_excel_extension("factura.pdf"));
        assert!(!has_excel_extension("factura"));
        assert!(!has_excel_extension(".xlsx"));
    }
}
