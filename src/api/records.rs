//! 笔记 / 任务共用的 CRUD 接口

use crate::error::ApiError;
use crate::models::Record;
use crate::service::MemoryStore;
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

fn validated<T: Record>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(record) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if record.title().trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    Ok(record)
}

pub async fn list_records<T: Record + Serialize>(State(store): State<Arc<MemoryStore<T>>>) -> Json<Vec<T>> {
    Json(store.list().await)
}

pub async fn get_record<T: Record + Serialize>(
    State(store): State<Arc<MemoryStore<T>>>,
    Path(id): Path<String>,
) -> Result<Json<T>, ApiError> {
    store.get(&id).await.map(Json).ok_or(ApiError::NotFound(T::NOT_FOUND))
}

pub async fn create_record<T: Record + Serialize + DeserializeOwned>(
    State(store): State<Arc<MemoryStore<T>>>,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<(StatusCode, Json<T>), ApiError> {
    let record = validated(payload)?;
    Ok((StatusCode::CREATED, Json(store.create(record).await)))
}

pub async fn update_record<T: Record + Serialize + DeserializeOwned>(
    State(store): State<Arc<MemoryStore<T>>>,
    Path(id): Path<String>,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<Json<T>, ApiError> {
    let record = validated(payload)?;
    store
        .update(&id, record)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound(T::NOT_FOUND))
}

pub async fn delete_record<T: Record>(
    State(store): State<Arc<MemoryStore<T>>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if store.delete(&id).await {
        Ok(Json(json!({ "message": T::DELETED })))
    } else {
        Err(ApiError::NotFound(T::NOT_FOUND))
    }
}
