pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use api::{router, AppState};
pub use config::AppConfig;
pub use db::{create_lazy_pool, create_pool, run_migrations};
pub use error::{ApiError, ParseError, ReceiptError};
pub use service::{ImageStore, MemoryStore, OcrService, ReceiptService};
