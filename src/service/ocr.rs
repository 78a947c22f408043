use crate::config::OcrConfig;
use crate::error::ReceiptError;
use crate::models::{ExpenseDocument, ExtractedReceipt};
use crate::service::extractor::extract_receipt;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_textract::config::{Credentials, Region};
use aws_sdk_textract::primitives::Blob;
use aws_sdk_textract::types::Document;
use aws_sdk_textract::Client;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;

/// 会话缓存状态。Ready / Unavailable 一经写入不再改变
#[derive(Debug)]
enum SessionState<T> {
    Uninitialized,
    Ready(Arc<T>),
    Unavailable(String),
}

/// 懒加载的会话缓存 (读锁检查 -> 写锁 -> 再检查 -> 构建)
///
/// 并发的首次调用只有一个会执行构建，其余等待写锁后复用结果
#[derive(Debug)]
pub struct SessionCache<T> {
    state: RwLock<SessionState<T>>,
}

impl<T> SessionCache<T> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::Uninitialized),
        }
    }

    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<T>, ReceiptError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        {
            let state = self.state.read().await;
            if let Some(result) = Self::settled(&state) {
                return result;
            }
        }

        let mut state = self.state.write().await;
        if let Some(result) = Self::settled(&state) {
            return result;
        }

        match init().await {
            Ok(session) => {
                let session = Arc::new(session);
                *state = SessionState::Ready(session.clone());
                Ok(session)
            }
            Err(reason) => {
                *state = SessionState::Unavailable(reason.clone());
                Err(ReceiptError::BackendUnavailable(reason))
            }
        }
    }

    fn settled(state: &SessionState<T>) -> Option<Result<Arc<T>, ReceiptError>> {
        match state {
            SessionState::Uninitialized => None,
            SessionState::Ready(session) => Some(Ok(session.clone())),
            SessionState::Unavailable(reason) => Some(Err(ReceiptError::BackendUnavailable(reason.clone()))),
        }
    }
}

impl<T> Default for SessionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 进程内共享的 AWS 会话
pub fn shared_session_cache() -> &'static SessionCache<SdkConfig> {
    static CACHE: OnceLock<SessionCache<SdkConfig>> = OnceLock::new();
    CACHE.get_or_init(SessionCache::new)
}

const MISSING_CREDENTIALS: &str =
    "AWS Textract client not available: please configure AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY";

/// 创建 AWS 会话并校验凭证
async fn build_session(config: &OcrConfig, key: String, secret: String) -> Result<SdkConfig, String> {
    let region = if config.region.is_empty() {
        tracing::info!("AWS region not specified, using default: us-east-1");
        "us-east-1".to_string()
    } else {
        tracing::info!("Using AWS region: {}", config.region);
        config.region.clone()
    };

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region))
        .credentials_provider(Credentials::new(key, secret, None, None, "receipt-scanner"))
        .load()
        .await;

    let provider = sdk_config
        .credentials_provider()
        .ok_or_else(|| "failed to create AWS session: no credentials provider".to_string())?;
    provider
        .provide_credentials()
        .await
        .map_err(|e| format!("invalid AWS credentials: {}", e))?;

    tracing::info!("AWS session created and cached successfully");
    Ok(sdk_config)
}

/// Textract OCR 服务
pub struct OcrService {
    client: Option<Client>,
    unavailable_reason: String,
}

impl OcrService {
    /// 使用进程级共享会话创建服务。凭证缺失或会话失败时服务不可用 (不会 panic)
    pub async fn new(config: &OcrConfig) -> Self {
        Self::with_cache(config, shared_session_cache()).await
    }

    pub async fn with_cache(config: &OcrConfig, cache: &SessionCache<SdkConfig>) -> Self {
        let Some((key, secret)) = config.credentials() else {
            tracing::warn!(
                "AWS credentials not properly configured. AWS_ACCESS_KEY_ID or AWS_SECRET_ACCESS_KEY environment variables are missing."
            );
            return Self::unavailable(MISSING_CREDENTIALS);
        };

        let (key, secret) = (key.to_string(), secret.to_string());
        match cache.get_or_init(|| build_session(config, key, secret)).await {
            Ok(session) => Self {
                client: Some(Client::new(&session)),
                unavailable_reason: String::new(),
            },
            Err(e) => {
                tracing::error!("AWS session error: {}", e);
                Self::unavailable(&e.to_string())
            }
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            client: None,
            unavailable_reason: reason.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// 识别一张收据图片，单次调用，不重试
    pub async fn process_receipt(&self, image_path: &Path) -> Result<ExtractedReceipt, ReceiptError> {
        let Some(client) = &self.client else {
            return Err(ReceiptError::BackendUnavailable(self.unavailable_reason.clone()));
        };

        let image_bytes = tokio::fs::read(image_path).await?;
        let document = Document::builder().bytes(Blob::new(image_bytes)).build();

        let start = std::time::Instant::now();
        let output = client
            .analyze_expense()
            .document(document)
            .send()
            .await
            .map_err(|e| ReceiptError::Transport(aws_sdk_textract::error::DisplayErrorContext(e).to_string()))?;
        tracing::info!("AnalyzeExpense completed in {:?}", start.elapsed());

        let documents: Vec<ExpenseDocument> = output
            .expense_documents
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExpenseDocument::from)
            .collect();

        Ok(extract_receipt(&documents, &image_path.to_string_lossy()))
    }
}
