use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 文本解析失败 (金额/日期)，只在本地使用，不向调用方暴露
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to parse {kind}: {input}")]
pub struct ParseError {
    pub kind: &'static str,
    pub input: String,
}

impl ParseError {
    pub fn amount(input: &str) -> Self {
        Self { kind: "amount", input: input.to_string() }
    }

    pub fn date(input: &str) -> Self {
        Self { kind: "date", input: input.to_string() }
    }
}

/// 收据流程错误
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid receipt ID")]
    InvalidId,

    #[error("{0}")]
    NotFound(String),

    /// OCR 后端未配置或会话创建失败
    #[error("OCR backend not configured: {0}")]
    BackendUnavailable(String),

    #[error("failed to analyze receipt with AWS Textract: {0}")]
    Transport(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReceiptError {
    pub fn status(&self) -> StatusCode {
        match self {
            ReceiptError::Validation(_) | ReceiptError::InvalidId => StatusCode::BAD_REQUEST,
            ReceiptError::NotFound(_) => StatusCode::NOT_FOUND,
            ReceiptError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ReceiptError::Transport(_) => StatusCode::BAD_GATEWAY,
            ReceiptError::Storage(_) | ReceiptError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReceiptError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// 笔记/任务接口错误
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
