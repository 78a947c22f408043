use crate::models::{ExpenseDocument, ExpenseField, ExtractedReceipt, NewReceipt, NewReceiptItem};
use crate::service::normalize::{best_effort, parse_amount, parse_date};
use chrono::{NaiveTime, TimeZone, Utc};

/// 将 AnalyzeExpense 结果映射为收据 + 明细
///
/// 不会失败：未识别的字段类型忽略，解析失败的字段保留默认值。
/// 多个文档时后出现的汇总字段覆盖先出现的；明细按出现顺序输出，并逐条补齐价格
pub fn extract_receipt(documents: &[ExpenseDocument], image_path: &str) -> ExtractedReceipt {
    let mut receipt = NewReceipt::new(image_path);
    let mut items = Vec::new();

    for doc in documents {
        for (field_type, value) in doc.summary_fields.iter().filter_map(ExpenseField::tagged) {
            apply_summary_field(&mut receipt, field_type, value);
        }

        for group in &doc.line_item_groups {
            for line_item in &group.line_items {
                let mut item = NewReceiptItem::default();
                for (field_type, value) in line_item.fields.iter().filter_map(ExpenseField::tagged) {
                    apply_item_field(&mut item, field_type, value);
                }
                item.reconcile_prices();
                items.push(item);
            }
        }
    }

    tracing::debug!(
        "extracted receipt store={:?} total={} items={}",
        receipt.store_name,
        receipt.total_amount,
        items.len()
    );

    ExtractedReceipt { receipt, items }
}

fn apply_summary_field(receipt: &mut NewReceipt, field_type: &str, value: &str) {
    match field_type {
        "VENDOR_NAME" => receipt.store_name = value.to_string(),
        "INVOICE_RECEIPT_DATE" => {
            if let Some(date) = best_effort(field_type, parse_date(value)) {
                receipt.purchase_date = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
            }
        }
        "TOTAL" => {
            if let Some(total) = best_effort(field_type, parse_amount(value)) {
                receipt.total_amount = total;
            }
        }
        _ => {}
    }
}

fn apply_item_field(item: &mut NewReceiptItem, field_type: &str, value: &str) {
    match field_type {
        "ITEM" => item.name = value.to_string(),
        "DESCRIPTION" => item.description = value.to_string(),
        "PRICE" => {
            if let Some(price) = best_effort(field_type, parse_amount(value)) {
                item.total_price = price;
            }
        }
        "QUANTITY" => {
            if let Some(quantity) = best_effort(field_type, parse_amount(value)) {
                item.quantity = quantity;
            }
        }
        "UNIT_PRICE" => {
            if let Some(unit_price) = best_effort(field_type, parse_amount(value)) {
                item.unit_price = unit_price;
            }
        }
        _ => {}
    }
}
