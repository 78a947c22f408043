use crate::error::ReceiptError;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// 单个文件上限 10MB
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "pdf"];

/// 上传图片存储目录
#[derive(Debug, Clone)]
pub struct ImageStore {
    upload_dir: PathBuf,
}

impl ImageStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// 写入 `receipt-<YYYYMMDD-HHMMSS><ext>`，同一秒内同扩展名会覆盖旧文件
    pub async fn save(&self, data: &[u8], file_name: &str) -> Result<PathBuf, ReceiptError> {
        self.save_at(data, file_name, Local::now()).await
    }

    pub async fn save_at(
        &self,
        data: &[u8],
        file_name: &str,
        now: DateTime<Local>,
    ) -> Result<PathBuf, ReceiptError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let path = self.upload_dir.join(generated_name(file_name, now));
        tokio::fs::write(&path, data).await?;

        tracing::info!("Saved receipt image {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }

    /// 删除已保存的图片，失败只记日志
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to remove image {}: {}", path.display(), e);
        }
    }
}

/// 原始文件名的扩展名 (含 '.')，没有则为空
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

fn generated_name(file_name: &str, now: DateTime<Local>) -> String {
    format!("receipt-{}{}", now.format("%Y%m%d-%H%M%S"), extension_of(file_name))
}

/// 上传校验：大小和扩展名，在任何写入之前执行
pub fn validate_upload(file_name: &str, size: usize) -> Result<(), ReceiptError> {
    if size == 0 {
        return Err(ReceiptError::Validation(
            "No file uploaded. Please select a receipt image.".to_string(),
        ));
    }
    if size > MAX_IMAGE_SIZE {
        return Err(ReceiptError::Validation(
            "File is too large. Maximum file size is 10MB.".to_string(),
        ));
    }

    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ReceiptError::Validation(
            "Invalid file type. Please upload an image file (jpg, png, gif, bmp) or PDF.".to_string(),
        ));
    }

    Ok(())
}
