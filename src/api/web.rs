//! 收据网页 (htmx 局部刷新)
//!
//! 片段接口出错时仍返回 200，错误信息放在 alert 片段里，方便前端直接替换

use crate::api::handlers::{parse_id, read_receipt_field, ListQuery};
use crate::error::ReceiptError;
use crate::models::{Receipt, ReceiptItem};
use crate::service::ReceiptService;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::{HeaderName, HeaderValue},
    response::{Html, IntoResponse, Response},
};
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Datelike, Local, Utc};
use std::fmt::Write;
use std::sync::Arc;
use url::form_urlencoded;

pub const WEB_PAGE_SIZE: i64 = 10;
const LIST_PATH: &str = "/receipts-web/list";

/// 转义 HTML 特殊字符
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub fn format_currency(amount: &BigDecimal) -> String {
    format!("${:.2}", amount.to_f64().unwrap_or_default())
}

fn format_quantity(quantity: &BigDecimal) -> String {
    format!("{:.2}", quantity.to_f64().unwrap_or_default())
}

pub fn error_fragment(message: &str) -> String {
    format!(
        r#"
    <div class="alert alert-danger">
        <strong>Error:</strong> {}
    </div>
    "#,
        escape_html(message)
    )
}

const CREDENTIALS_HELP: &str = r#"
<div class="alert alert-danger">
    <strong>AWS credentials not configured</strong>
    <p>Please set the following environment variables to use the receipt scanner:</p>
    <ul>
        <li>AWS_ACCESS_KEY_ID - Your AWS access key</li>
        <li>AWS_SECRET_ACCESS_KEY - Your AWS secret key</li>
        <li>AWS_REGION - AWS region (e.g., us-east-1)</li>
    </ul>
    <p>These credentials are required to use AWS Textract for receipt processing.</p>
</div>
"#;

/// 完整页面布局
pub fn render_page(title: &str, content: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Receipt Scanner</title>
    <link rel="stylesheet" href="/static/css/style.css">
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
</head>
<body>
    <header>
        <div class="container navbar">
            <div class="logo">Receipt Scanner</div>
            <nav class="nav-links">
                <a href="/receipts-web/">Home</a>
                <a href="/receipts-web/upload">Upload</a>
                <a href="/receipts-web/list">My Receipts</a>
            </nav>
        </div>
    </header>

    <main>
        <div class="container">
            {content}
        </div>
    </main>

    <footer>
        <div class="container text-center">
            <p>&copy; {year} Receipt Scanner App</p>
        </div>
    </footer>
</body>
</html>
"#,
        title = escape_html(title),
        content = content,
        year = Local::now().year(),
    ))
}

fn fragment(html: String) -> Response {
    Html(html).into_response()
}

pub async fn home_page() -> Html<String> {
    render_page(
        "Home",
        r#"
<div class="card">
    <div class="card-header">
        <h1 class="card-title">Receipt Scanner App</h1>
    </div>
    <p>Welcome to the Receipt Scanner App! This application helps you track your purchases by scanning and storing your receipts.</p>
    <ul>
        <li>Upload images of your receipts</li>
        <li>Automatically extract store, item, and price information</li>
        <li>Keep track of all your purchases in one place</li>
    </ul>
    <div class="mt-4">
        <a href="/receipts-web/upload" class="btn btn-primary">Upload a Receipt</a>
        <a href="/receipts-web/list" class="btn btn-secondary">View My Receipts</a>
    </div>
</div>
"#,
    )
}

pub async fn upload_page() -> Html<String> {
    render_page(
        "Upload Receipt",
        r##"
<div class="card">
    <div class="card-header">
        <h1 class="card-title">Upload Receipt</h1>
    </div>

    <div id="upload-error-container"></div>

    <form hx-post="/receipts-web/htmx/upload"
          hx-encoding="multipart/form-data"
          hx-indicator="#form-submit-indicator"
          hx-target="#upload-error-container"
          hx-swap="innerHTML"
          class="upload-form">
        <div class="form-group">
            <label for="receipt">Receipt Image</label>
            <input type="file" id="receipt" name="receipt" accept="image/*,application/pdf" required>
        </div>
        <div class="form-group text-center">
            <button type="submit" class="btn btn-primary" id="upload-button">
                <span id="form-submit-indicator" class="htmx-indicator">
                    <span class="loading-spinner"></span> Processing...
                </span>
                <span class="htmx-indicator-inverse">Upload Receipt</span>
            </button>
        </div>
    </form>
</div>
"##,
    )
}

pub async fn list_page() -> Html<String> {
    render_page(
        "My Receipts",
        r##"
<div class="card">
    <div class="card-header">
        <h1 class="card-title">My Receipts</h1>
    </div>
    <div id="receipts-list"
         hx-get="/receipts-web/htmx/receipts"
         hx-trigger="load"
         hx-indicator="#receipts-loading">
        <div class="text-center mt-3">
            <div id="receipts-loading" class="loading-spinner htmx-indicator"></div>
            <p>Loading receipts...</p>
        </div>
    </div>
</div>
"##,
    )
}

pub async fn view_page(Path(id): Path<String>) -> Html<String> {
    let id = escape_html(&id);
    render_page(
        "View Receipt",
        &format!(
            r##"
<div class="card">
    <div class="card-header">
        <h1 class="card-title">View Receipt</h1>
        <a href="/receipts-web/list" class="btn btn-secondary">Back to List</a>
    </div>
    <div id="receipt-details"
         hx-get="/receipts-web/htmx/receipt/{id}"
         hx-trigger="load"
         hx-indicator="#details-loading">
        <div class="text-center mt-3">
            <div id="details-loading" class="loading-spinner htmx-indicator"></div>
            <p>Loading receipt details...</p>
        </div>
    </div>
    <div id="receipt-items"
         hx-get="/receipts-web/htmx/receipt/{id}/items"
         hx-trigger="load"
         hx-indicator="#items-loading">
        <div class="text-center mt-3">
            <div id="items-loading" class="loading-spinner htmx-indicator"></div>
            <p>Loading receipt items...</p>
        </div>
    </div>
</div>
"##
        ),
    )
}

/// 上传片段：成功时通过 HX-Redirect 跳转到列表页
pub async fn htmx_upload(
    State(service): State<Arc<ReceiptService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(mut multipart) = multipart else {
        return fragment(error_fragment("Failed to parse form"));
    };
    let file = match read_receipt_field(&mut multipart).await {
        Ok(file) => file,
        Err(e) => return fragment(error_fragment(&e.to_string())),
    };

    let image_path = match service.store_upload(&file.file_name, &file.data).await {
        Ok(path) => path,
        Err(ReceiptError::Validation(msg)) => return fragment(error_fragment(&msg)),
        Err(e) => return fragment(error_fragment(&format!("Failed to save image: {}", e))),
    };

    let extracted = match service.recognize(&image_path).await {
        Ok(extracted) => extracted,
        Err(e) => {
            service.images().remove(&image_path).await;
            let body = match e {
                ReceiptError::BackendUnavailable(_) => CREDENTIALS_HELP.to_string(),
                other => error_fragment(&format!("Error processing receipt: {}", other)),
            };
            return fragment(body);
        }
    };

    if let Err(e) = service.persist(&extracted).await {
        return fragment(error_fragment(&format!("Failed to save receipt: {}", e)));
    }

    (
        [(HeaderName::from_static("hx-redirect"), HeaderValue::from_static(LIST_PATH))],
        Html(String::new()),
    )
        .into_response()
}

/// 收据列表片段
pub async fn htmx_list_receipts(
    State(service): State<Arc<ReceiptService>>,
    Query(query): Query<ListQuery>,
) -> Html<String> {
    let page = match service
        .list(query.page(), WEB_PAGE_SIZE, query.search.as_deref())
        .await
    {
        Ok(page) if !page.receipts.is_empty() => page,
        Ok(_) => return Html(empty_list_fragment()),
        Err(e) => {
            tracing::warn!("Failed to list receipts: {}", e);
            return Html(empty_list_fragment());
        }
    };

    let mut html = receipts_table(&page.receipts);
    if page.has_more() {
        html.push_str(&load_more_button(page.page + 1, query.search.as_deref()));
    }
    Html(html)
}

/// 下一页按钮，点击后用下一页内容替换按钮本身 (保留已加载的行)
pub fn load_more_button(next_page: i64, search: Option<&str>) -> String {
    let mut url = format!("/receipts-web/htmx/receipts?page={}", next_page);
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        url.push_str("&search=");
        url.extend(form_urlencoded::byte_serialize(search.as_bytes()));
    }

    format!(
        r#"
<div class="mt-3 text-center">
    <button class="btn btn-secondary"
            hx-get="{}"
            hx-target="closest div"
            hx-swap="outerHTML">
        Load More
    </button>
</div>
"#,
        escape_html(&url)
    )
}

fn empty_list_fragment() -> String {
    r#"<p>No receipts found. <a href="/receipts-web/upload">Upload your first receipt</a>.</p>"#.to_string()
}

pub fn receipts_table(receipts: &[Receipt]) -> String {
    let mut html = String::from(
        r#"<div class="table-responsive"><table class="table"><thead><tr><th>Store</th><th>Date</th><th>Amount</th><th>Actions</th></tr></thead><tbody>"#,
    );
    for receipt in receipts {
        let _ = write!(
            html,
            r#"
<tr>
    <td>{}</td>
    <td>{}</td>
    <td>{}</td>
    <td><a href="/receipts-web/view/{}" class="btn btn-sm btn-info">View</a></td>
</tr>
"#,
            escape_html(&receipt.store_name),
            format_date(&receipt.purchase_date),
            format_currency(&receipt.total_amount),
            receipt.id
        );
    }
    html.push_str("</tbody></table></div>");
    html
}

/// 单张收据片段
pub async fn htmx_get_receipt(State(service): State<Arc<ReceiptService>>, Path(id): Path<String>) -> Html<String> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return Html(error_fragment(&e.to_string())),
    };
    match service.get(id).await {
        Ok(receipt) => Html(receipt_details(&receipt)),
        Err(_) => Html(error_fragment("Receipt not found")),
    }
}

pub fn receipt_details(receipt: &Receipt) -> String {
    let image_name = std::path::Path::new(&receipt.image_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    format!(
        r#"
<div class="receipt-details">
    <h2>Receipt Details</h2>
    <dl class="receipt-info">
        <dt>Store:</dt>
        <dd>{}</dd>
        <dt>Date:</dt>
        <dd>{}</dd>
        <dt>Total Amount:</dt>
        <dd>{}</dd>
    </dl>
    <div class="receipt-image-container">
        <img src="/uploads/receipts/{}" alt="Receipt Image" class="receipt-image" />
    </div>
</div>
"#,
        escape_html(&receipt.store_name),
        format_date(&receipt.purchase_date),
        format_currency(&receipt.total_amount),
        escape_html(&image_name)
    )
}

/// 收据明细片段
pub async fn htmx_get_receipt_items(
    State(service): State<Arc<ReceiptService>>,
    Path(id): Path<String>,
) -> Html<String> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return Html(error_fragment(&e.to_string())),
    };
    match service.items(id).await {
        Ok(items) if !items.is_empty() => Html(items_table(&items)),
        _ => Html(error_fragment("No items found for this receipt")),
    }
}

pub fn items_table(items: &[ReceiptItem]) -> String {
    let mut html = String::from(
        r#"
<div class="receipt-items">
    <h2>Receipt Items</h2>
    <div class="table-responsive">
        <table class="table">
            <thead>
                <tr><th>Item</th><th>Description</th><th>Quantity</th><th>Unit Price</th><th>Total</th></tr>
            </thead>
            <tbody>
"#,
    );

    let mut total = BigDecimal::from(0);
    for item in items {
        total += &item.total_price;
        let _ = write!(
            html,
            r#"
                <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>
"#,
            escape_html(&item.name),
            escape_html(&item.description),
            format_quantity(&item.quantity),
            format_currency(&item.unit_price),
            format_currency(&item.total_price)
        );
    }

    let _ = write!(
        html,
        r#"
            </tbody>
            <tfoot>
                <tr><th colspan="4" class="text-right">Total:</th><th>{}</th></tr>
            </tfoot>
        </table>
    </div>
</div>
"#,
        format_currency(&total)
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn receipt(store_name: &str) -> Receipt {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        Receipt {
            id: 7,
            store_id: 1,
            store_name: store_name.to_string(),
            purchase_date: date,
            total_amount: dec("12.5"),
            image_path: "./uploads/receipts/receipt-20240102-101010.png".to_string(),
            created_at: date,
            updated_at: date,
        }
    }

    fn item(name: &str, qty: &str, unit: &str, total: &str) -> ReceiptItem {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        ReceiptItem {
            id: 1,
            receipt_id: 7,
            name: name.to_string(),
            description: String::new(),
            quantity: dec(qty),
            unit_price: dec(unit),
            total_price: dec(total),
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn formats_dates_and_money() {
        let date = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(format_date(&date), "January 2, 2006");
        assert_eq!(format_currency(&dec("1234.5")), "$1234.50");
        assert_eq!(format_currency(&dec("0")), "$0.00");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<b>"Tom's" & co</b>"#), "&lt;b&gt;&quot;Tom&#39;s&quot; &amp; co&lt;/b&gt;");
    }

    #[test]
    fn error_fragment_is_escaped_alert() {
        let html = error_fragment("bad <input>");
        assert!(html.contains("alert-danger"));
        assert!(html.contains("bad &lt;input&gt;"));
    }

    #[test]
    fn details_link_image_by_file_name() {
        let html = receipt_details(&receipt("Corner <Market>"));
        assert!(html.contains("Corner &lt;Market&gt;"));
        assert!(html.contains("January 2, 2024"));
        assert!(html.contains("$12.50"));
        assert!(html.contains(r#"src="/uploads/receipts/receipt-20240102-101010.png""#));
    }

    #[tokio::test]
    async fn pages_keep_htmx_selectors() {
        let Html(upload) = upload_page().await;
        assert!(upload.contains(r##"hx-indicator="#form-submit-indicator""##));
        assert!(upload.contains(r##"hx-target="#upload-error-container""##));

        let Html(list) = list_page().await;
        assert!(list.contains(r##"hx-indicator="#receipts-loading""##));

        let Html(view) = view_page(Path("5".to_string())).await;
        assert!(view.contains(r#"hx-get="/receipts-web/htmx/receipt/5/items""#));
        assert!(view.contains(r##"hx-indicator="#items-loading""##));
    }

    #[test]
    fn load_more_keeps_search() {
        let html = load_more_button(2, Some("corner & co"));
        assert!(html.contains(r#"hx-get="/receipts-web/htmx/receipts?page=2&amp;search=corner+%26+co""#));
        assert!(load_more_button(3, None).contains(r#"hx-get="/receipts-web/htmx/receipts?page=3""#));
        assert!(load_more_button(3, Some("  ")).contains(r#"?page=3""#));
    }

    #[test]
    fn table_links_to_view_page() {
        let html = receipts_table(&[receipt("Shop")]);
        assert!(html.contains(r#"href="/receipts-web/view/7""#));
    }

    #[test]
    fn items_table_sums_totals() {
        let html = items_table(&[item("Bread", "1", "5", "5"), item("Milk", "2", "4.5", "9")]);
        assert!(html.contains("<td>2.00</td>"));
        assert!(html.contains("<td>$4.50</td>"));
        assert!(html.contains("<th>$14.00</th>"));
    }

    #[test]
    fn page_has_layout_and_title() {
        let Html(page) = render_page("Home", "<p>hi</p>");
        assert!(page.contains("<title>Home - Receipt Scanner</title>"));
        assert!(page.contains("htmx.org"));
        assert!(page.contains("<p>hi</p>"));
    }
}
