use crate::config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::time::Duration;

/// 由配置各字段构建连接参数
pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database)
        // 设置慢查询日志阈值为 5秒
        .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5))
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
}

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        "Connecting to database with: host={} port={} dbname={}",
        config.host,
        config.port,
        config.database
    );
    pool_options(config).connect_with(connect_options(config)).await
}

/// 不立即建立连接的连接池 (首次查询时才连接)
pub fn create_lazy_pool(config: &DatabaseConfig) -> PgPool {
    pool_options(config).connect_lazy_with(connect_options(config))
}

/// 执行内置迁移
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
