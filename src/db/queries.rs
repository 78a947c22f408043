use crate::models::{NewReceipt, NewReceiptItem, Receipt, ReceiptItem, DEFAULT_STORE_ID};
use chrono::Utc;
use sqlx::{PgConnection, PgPool};

/// 确保默认门店 (id=1) 存在，重复执行无副作用
pub async fn ensure_default_store(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO stores (id, name, address, created_at, updated_at)
        VALUES ($1, 'Sample Store', '123 Sample St, Sample City', $2, $3)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(DEFAULT_STORE_ID)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// 插入收据主表，返回新 ID
pub async fn insert_receipt(conn: &mut PgConnection, receipt: &NewReceipt) -> Result<i64, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO receipts (store_id, store_name, purchase_date, total_amount, image_path, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(receipt.store_id)
    .bind(&receipt.store_name)
    .bind(receipt.purchase_date)
    .bind(&receipt.total_amount)
    .bind(&receipt.image_path)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// 批量插入收据明细 (保持顺序)
pub async fn insert_receipt_items(
    conn: &mut PgConnection,
    receipt_id: i64,
    items: &[NewReceiptItem],
) -> Result<(), sqlx::Error> {
    if items.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let mut query_builder = sqlx::QueryBuilder::new(
        "INSERT INTO receipt_items (
            receipt_id, name, description, quantity, unit_price, total_price, created_at, updated_at
        ) ",
    );

    query_builder.push_values(items, |mut b, item| {
        b.push_bind(receipt_id)
            .push_bind(&item.name)
            .push_bind(&item.description)
            .push_bind(item.quantity.clone())
            .push_bind(item.unit_price.clone())
            .push_bind(item.total_price.clone())
            .push_bind(now)
            .push_bind(now);
    });

    let result = query_builder.build().execute(conn).await?;
    tracing::debug!("inserted {} items for receipt {}", result.rows_affected(), receipt_id);
    Ok(())
}

/// 查询收据主表
pub async fn get_receipt(pool: &PgPool, id: i64) -> Result<Option<Receipt>, sqlx::Error> {
    sqlx::query_as::<_, Receipt>(
        r#"
        SELECT id, store_id, store_name, purchase_date, total_amount, image_path, created_at, updated_at
        FROM receipts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// 查询收据明细 (按 ID 升序)
pub async fn list_receipt_items(pool: &PgPool, receipt_id: i64) -> Result<Vec<ReceiptItem>, sqlx::Error> {
    sqlx::query_as::<_, ReceiptItem>(
        r#"
        SELECT id, receipt_id, name, description, quantity, unit_price, total_price, created_at, updated_at
        FROM receipt_items
        WHERE receipt_id = $1
        ORDER BY id
        "#,
    )
    .bind(receipt_id)
    .fetch_all(pool)
    .await
}

/// 门店名模糊匹配的 ILIKE 模式，转义通配符
fn search_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// 分页查询收据 (购买日期降序)，search 为空时不过滤
pub async fn list_receipts(
    pool: &PgPool,
    limit: i64,
    offset: i64,
    search: Option<&str>,
) -> Result<Vec<Receipt>, sqlx::Error> {
    sqlx::query_as::<_, Receipt>(
        r#"
        SELECT id, store_id, store_name, purchase_date, total_amount, image_path, created_at, updated_at
        FROM receipts
        WHERE ($1::text IS NULL OR store_name ILIKE $1)
        ORDER BY purchase_date DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(search.map(search_pattern))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// 统计匹配的收据数量
pub async fn count_receipts(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT count(*)
        FROM receipts
        WHERE ($1::text IS NULL OR store_name ILIKE $1)
        "#,
    )
    .bind(search.map(search_pattern))
    .fetch_one(pool)
    .await
}
