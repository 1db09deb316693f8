use std::io;
use std::path::{Path, PathBuf};

use rocket::fs::TempFile;
use rocket::tokio::fs;

use crate::errors::AppError;
use crate::validation;

/// 保存先の種類。公開URLとディレクトリ名が対応します。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadKind {
    Task,
    Profile,
}

impl UploadKind {
    fn dir_name(&self) -> &'static str {
        match self {
            UploadKind::Task => "tasks",
            UploadKind::Profile => "profiles",
        }
    }
}

/// アップロードされたファイルのメタデータ。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadMeta {
    /// クライアントが送ってきた元のファイル名 (パス部分は除去済み)
    pub name: String,
    pub extension: String,
    pub mime_type: String,
    pub size: i64,
}

impl UploadMeta {
    /// `TempFile` からメタデータを取り出します。
    pub fn from_temp_file(file: &TempFile<'_>) -> Self {
        let raw = file
            .raw_name()
            .map(|n| n.dangerous_unsafe_unsanitized_raw().as_str().to_string())
            .unwrap_or_default();
        let name = base_name(&raw);

        let mime_type = file
            .content_type()
            .map(|ct| format!("{}/{}", ct.top(), ct.sub()))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let extension = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .or_else(|| {
                file.content_type()
                    .and_then(|ct| ct.extension())
                    .map(|e| e.as_str().to_lowercase())
            })
            .unwrap_or_default();

        let name = if name.is_empty() {
            file.name().unwrap_or("upload").to_string()
        } else {
            name
        };

        Self { name, extension, mime_type, size: file.len() as i64 }
    }

    /// 添付ファイルとして受け付けられる形式か検証します。
    pub fn ensure_document(&self) -> Result<(), AppError> {
        if validation::is_allowed_upload(&self.extension, &self.mime_type) {
            Ok(())
        } else {
            Err(AppError::Validation("Only image and document files are allowed!".into()))
        }
    }

    pub fn ensure_image(&self) -> Result<(), AppError> {
        if validation::is_allowed_image(&self.extension, &self.mime_type) {
            Ok(())
        } else {
            Err(AppError::Validation("Only image files are allowed!".into()))
        }
    }
}

/// 保存予定のファイル。名前を先に確定させ、メタデータ書き込み後に本体を保存する。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub url: String,
    pub path: PathBuf,
}

/// ローカルディスク上のアップロード領域。
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `tasks/` と `profiles/` を作成します。
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for kind in [UploadKind::Task, UploadKind::Profile] {
            fs::create_dir_all(self.root.join(kind.dir_name())).await?;
        }
        Ok(())
    }

    /// UUID でファイル名を割り当てます。
    pub fn allocate(&self, kind: UploadKind, extension: &str) -> StoredFile {
        let file_name = if extension.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", uuid::Uuid::new_v4(), extension)
        };

        StoredFile {
            url: format!("/uploads/{}/{}", kind.dir_name(), file_name),
            path: self.root.join(kind.dir_name()).join(file_name),
        }
    }

    /// 一時ファイルを割り当て済みのパスへ移動します。
    pub async fn persist(&self, file: &mut TempFile<'_>, target: &StoredFile) -> io::Result<()> {
        file.move_copy_to(&target.path).await
    }

    /// 公開URLに対応するファイルを削除します。既に無い場合は何もしない。
    pub async fn remove_url(&self, url: &str) {
        let Some(path) = self.path_for_url(url) else {
            tracing::warn!(url, "refusing to remove file outside upload directory");
            return;
        };

        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "removed upload"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove upload"),
        }
    }

    pub async fn remove_all<'a, I>(&self, urls: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for url in urls {
            self.remove_url(url).await;
        }
    }

    // `/uploads/<kind>/<file>` 以外は扱わない
    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix("/uploads/")?;
        let (dir, file) = rest.split_once('/')?;
        if !matches!(dir, "tasks" | "profiles") {
            return None;
        }
        if file.is_empty() || file.contains('/') || file.contains('\\') || file.starts_with('.') {
            return None;
        }
        Some(self.root.join(dir).join(file))
    }
}

fn base_name(raw: &str) -> String {
    raw.rsplit(['/', '\\']).next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_uses_kind_directory() {
        let storage = FileStorage::new("/srv/uploads");
        let task_file = storage.allocate(UploadKind::Task, "pdf");
        let profile_file = storage.allocate(UploadKind::Profile, "png");

        assert!(task_file.url.starts_with("/uploads/tasks/"));
        assert!(task_file.url.ends_with(".pdf"));
        assert!(task_file.path.starts_with("/srv/uploads/tasks"));
        assert!(profile_file.url.starts_with("/uploads/profiles/"));
        assert_ne!(task_file.url, storage.allocate(UploadKind::Task, "pdf").url);
    }

    #[test]
    fn test_path_for_url_stays_inside_root() {
        let storage = FileStorage::new("/srv/uploads");
        assert_eq!(
            storage.path_for_url("/uploads/tasks/a.pdf"),
            Some(PathBuf::from("/srv/uploads/tasks/a.pdf"))
        );
        assert_eq!(storage.path_for_url("/uploads/tasks/../../etc/passwd"), None);
        assert_eq!(storage.path_for_url("/uploads/other/a.pdf"), None);
        assert_eq!(storage.path_for_url("/uploads/tasks/..hidden"), None);
        assert_eq!(storage.path_for_url("https://cdn.example.com/a.pdf"), None);
    }

    #[test]
    fn test_base_name_strips_client_paths() {
        assert_eq!(base_name("C:\\Users\\bob\\report.xlsx"), "report.xlsx");
        assert_eq!(base_name("../notes.txt"), "notes.txt");
        assert_eq!(base_name("plain.pdf"), "plain.pdf");
    }

    #[rocket::async_test]
    async fn test_remove_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.ensure_dirs().await.unwrap();

        let stored = storage.allocate(UploadKind::Task, "txt");
        fs::write(&stored.path, b"hello").await.unwrap();
        storage.remove_url(&stored.url).await;
        assert!(!stored.path.exists());

        storage.remove_url(&stored.url).await;
    }
}
