use crate::db::queries;
use crate::error::ReceiptError;
use crate::models::{ExtractedReceipt, Receipt, ReceiptItem};
use crate::service::images::{validate_upload, ImageStore};
use crate::service::ocr::OcrService;
use serde::Serialize;
use sqlx::PgPool;
use std::path::{Path, PathBuf};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// 上传并入库后的结果
#[derive(Debug, Clone)]
pub struct ScannedReceipt {
    pub id: i64,
    pub extracted: ExtractedReceipt,
}

/// 分页结果
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptPage {
    pub receipts: Vec<Receipt>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl ReceiptPage {
    pub fn has_more(&self) -> bool {
        self.total > self.page * self.page_size
    }
}

/// 收据服务：保存图片 -> OCR -> 入库
pub struct ReceiptService {
    pool: PgPool,
    ocr: OcrService,
    images: ImageStore,
}

impl ReceiptService {
    pub fn new(pool: PgPool, ocr: OcrService, images: ImageStore) -> Self {
        Self { pool, ocr, images }
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// 校验并保存上传的图片，返回保存路径
    pub async fn store_upload(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, ReceiptError> {
        validate_upload(file_name, data.len())?;
        self.images.save(data, file_name).await
    }

    /// 只做 OCR 识别，不写数据库
    pub async fn recognize(&self, image_path: &Path) -> Result<ExtractedReceipt, ReceiptError> {
        self.ocr.process_receipt(image_path).await
    }

    /// 对已保存的图片执行 OCR 并入库
    ///
    /// OCR 失败时不写数据库，图片保留在磁盘上，由调用方决定是否删除
    pub async fn scan(&self, image_path: &Path) -> Result<ScannedReceipt, ReceiptError> {
        let extracted = self.recognize(image_path).await?;
        let id = self.persist(&extracted).await?;

        tracing::info!(
            "Receipt {} saved: store={:?}, total={}, items={}",
            id,
            extracted.receipt.store_name,
            extracted.receipt.total_amount,
            extracted.items.len()
        );
        Ok(ScannedReceipt { id, extracted })
    }

    /// 收据与明细在同一事务中写入，任一失败整体回滚
    pub async fn persist(&self, extracted: &ExtractedReceipt) -> Result<i64, ReceiptError> {
        let mut tx = self.pool.begin().await?;

        queries::ensure_default_store(&mut *tx).await?;
        let receipt_id = queries::insert_receipt(&mut *tx, &extracted.receipt).await?;
        queries::insert_receipt_items(&mut *tx, receipt_id, &extracted.items).await?;

        tx.commit().await?;
        Ok(receipt_id)
    }

    pub async fn get(&self, id: i64) -> Result<Receipt, ReceiptError> {
        queries::get_receipt(&self.pool, id)
            .await?
            .ok_or_else(|| ReceiptError::NotFound("Receipt not found".to_string()))
    }

    pub async fn items(&self, receipt_id: i64) -> Result<Vec<ReceiptItem>, ReceiptError> {
        Ok(queries::list_receipt_items(&self.pool, receipt_id).await?)
    }

    /// 分页列表。page < 1 视为 1，page_size < 1 视为 10，空 search 不过滤
    pub async fn list(&self, page: i64, page_size: i64, search: Option<&str>) -> Result<ReceiptPage, ReceiptError> {
        let (page, page_size) = normalize_page(page, page_size);
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let offset = (page - 1) * page_size;

        let receipts = queries::list_receipts(&self.pool, page_size, offset, search).await?;
        let total = queries::count_receipts(&self.pool, search).await?;

        Ok(ReceiptPage {
            receipts,
            total,
            page,
            page_size,
        })
    }
}

fn normalize_page(page: i64, page_size: i64) -> (i64, i64) {
    let page = if page < 1 { 1 } else { page };
    let page_size = if page_size < 1 { DEFAULT_PAGE_SIZE } else { page_size };
    (page, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults() {
        assert_eq!(normalize_page(0, 0), (1, 10));
        assert_eq!(normalize_page(-3, 25), (1, 25));
        assert_eq!(normalize_page(4, 5), (4, 5));
    }

    #[test]
    fn has_more_pages() {
        let page = ReceiptPage {
            receipts: vec![],
            total: 21,
            page: 2,
            page_size: 10,
        };
        assert!(page.has_more());
        assert!(!ReceiptPage { page: 3, ..page }.has_more());
    }
}
