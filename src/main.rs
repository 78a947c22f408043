use receipt_scanner::{
    create_pool, router, run_migrations, AppConfig, AppState, ImageStore, OcrService, ReceiptService,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式，级别由 RUST_LOG 控制
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::global();
    info!("Starting server with config: {:?}", config);

    // 数据库连接池 + 迁移
    let pool = create_pool(&config.database).await?;
    info!("Database pool created");
    run_migrations(&pool).await?;
    info!("Database migrations applied");

    tokio::fs::create_dir_all(&config.storage.upload_dir).await?;

    // OCR 不可用时服务照常启动，上传接口返回 503
    let ocr = OcrService::new(&config.ocr).await;
    if !ocr.is_available() {
        warn!("AWS Textract is not available; receipt uploads will be rejected");
    }

    let images = ImageStore::new(config.storage.upload_dir.clone());
    let receipts = ReceiptService::new(pool, ocr, images);
    let state = AppState::new(receipts, config.storage.static_dir.clone());

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.write_timeout)))
            .layer(RequestBodyTimeoutLayer::new(Duration::from_secs(config.server.read_timeout))),
    );

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /receipts/upload          - Upload and scan a receipt");
    info!("  GET  /receipts/                - List receipts");
    info!("  GET  /receipts/:id             - Receipt details");
    info!("  GET  /receipts/:id/items       - Receipt items");
    info!("  *    /api/v1/notes, /api/v1/tasks - Notes and tasks");
    info!("  GET  /receipts-web/            - Web interface");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
