pub mod handlers;
pub mod records;
pub mod web;

pub use handlers::*;

use crate::models::{Note, Task};
use crate::service::{MemoryStore, ReceiptService};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

/// 上传请求体上限 (multipart 解析内存上限)
pub const MAX_BODY_SIZE: usize = 32 << 20;

/// 共享状态：收据服务 + 笔记/任务存储
#[derive(Clone)]
pub struct AppState {
    pub receipts: Arc<ReceiptService>,
    pub notes: Arc<MemoryStore<Note>>,
    pub tasks: Arc<MemoryStore<Task>>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(receipts: ReceiptService, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            receipts: Arc::new(receipts),
            notes: Arc::new(MemoryStore::new()),
            tasks: Arc::new(MemoryStore::new()),
            static_dir: static_dir.into(),
        }
    }
}

/// 构建全部路由，每组路由各自持有自己的状态后合并
pub fn router(state: AppState) -> Router {
    let upload_dir = state.receipts.images().upload_dir().to_path_buf();

    let receipt_routes = Router::new()
        .route("/receipts/upload", post(upload_receipt))
        .route("/receipts", get(list_receipts))
        .route("/receipts/", get(list_receipts))
        .route("/receipts/:id", get(get_receipt))
        .route("/receipts/:id/items", get(get_receipt_items))
        .with_state(state.receipts.clone());

    let note_routes = Router::new()
        .route(
            "/api/v1/notes",
            get(records::list_records::<Note>).post(records::create_record::<Note>),
        )
        .route(
            "/api/v1/notes/:id",
            get(records::get_record::<Note>)
                .put(records::update_record::<Note>)
                .delete(records::delete_record::<Note>),
        )
        .with_state(state.notes);

    let task_routes = Router::new()
        .route(
            "/api/v1/tasks",
            get(records::list_records::<Task>).post(records::create_record::<Task>),
        )
        .route(
            "/api/v1/tasks/:id",
            get(records::get_record::<Task>)
                .put(records::update_record::<Task>)
                .delete(records::delete_record::<Task>),
        )
        .with_state(state.tasks);

    let web_routes = Router::new()
        .route("/receipts-web", get(web::home_page))
        .route("/receipts-web/", get(web::home_page))
        .route("/receipts-web/upload", get(web::upload_page))
        .route("/receipts-web/list", get(web::list_page))
        .route("/receipts-web/view/:id", get(web::view_page))
        .route("/receipts-web/htmx/upload", post(web::htmx_upload))
        .route("/receipts-web/htmx/receipts", get(web::htmx_list_receipts))
        .route("/receipts-web/htmx/receipt/:id", get(web::htmx_get_receipt))
        .route("/receipts-web/htmx/receipt/:id/items", get(web::htmx_get_receipt_items))
        .with_state(state.receipts);

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .merge(receipt_routes)
        .merge(note_routes)
        .merge(task_routes)
        .merge(web_routes)
        .nest_service("/static", ServeDir::new(state.static_dir))
        .nest_service("/uploads/receipts", ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
}
