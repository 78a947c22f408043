use crate::error::ReceiptError;
use crate::models::{Receipt, ReceiptItem};
use crate::service::receipts::{ReceiptPage, DEFAULT_PAGE_SIZE};
use crate::service::ReceiptService;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Json, Multipart, Path, Query, State},
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// 上传表单中的文件字段名
pub const RECEIPT_FIELD: &str = "receipt";

/// 上传成功响应体
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: i64,
    pub store_name: String,
    pub purchase_date: DateTime<Utc>,
    #[serde(serialize_with = "crate::models::receipt::as_number")]
    pub total_amount: BigDecimal,
    pub items_count: usize,
}

/// 列表查询参数，非法数字按默认值处理
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> i64 {
        self.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// 上传的文件
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// 读取 multipart 中的 `receipt` 字段
pub async fn read_receipt_field(multipart: &mut Multipart) -> Result<UploadedFile, ReceiptError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ReceiptError::Validation(format!("Failed to parse form: {}", e)))?;
        let Some(field) = field else {
            return Err(ReceiptError::Validation(
                "No file uploaded. Please select a receipt image.".to_string(),
            ));
        };

        if field.name() != Some(RECEIPT_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ReceiptError::Validation(format!("Failed to read file: {}", e)))?;
        return Ok(UploadedFile { file_name, data });
    }
}

pub fn parse_id(raw: &str) -> Result<i64, ReceiptError> {
    raw.parse().map_err(|_| ReceiptError::InvalidId)
}

/// 健康检查
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to Cereja Corp" }))
}

/// 上传收据：保存图片 -> OCR -> 入库
pub async fn upload_receipt(
    State(service): State<Arc<ReceiptService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ReceiptError> {
    let mut multipart = multipart.map_err(|e| ReceiptError::Validation(format!("Failed to parse form: {}", e)))?;
    let file = read_receipt_field(&mut multipart).await?;
    let image_path = service.store_upload(&file.file_name, &file.data).await?;
    let scanned = service.scan(&image_path).await?;

    let receipt = scanned.extracted.receipt;
    Ok(Json(UploadResponse {
        id: scanned.id,
        store_name: receipt.store_name,
        purchase_date: receipt.purchase_date,
        total_amount: receipt.total_amount,
        items_count: scanned.extracted.items.len(),
    }))
}

/// 查询单张收据
pub async fn get_receipt(
    State(service): State<Arc<ReceiptService>>,
    Path(id): Path<String>,
) -> Result<Json<Receipt>, ReceiptError> {
    let id = parse_id(&id)?;
    Ok(Json(service.get(id).await?))
}

/// 查询收据明细
pub async fn get_receipt_items(
    State(service): State<Arc<ReceiptService>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReceiptItem>>, ReceiptError> {
    let id = parse_id(&id)?;
    Ok(Json(service.items(id).await?))
}

/// 分页列表
pub async fn list_receipts(
    State(service): State<Arc<ReceiptService>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ReceiptPage>, ReceiptError> {
    let page = service
        .list(query.page(), query.page_size(), query.search.as_deref())
        .await?;
    Ok(Json(page))
}
