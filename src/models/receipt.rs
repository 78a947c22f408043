use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;

/// 没有供应商匹配，所有收据都挂在这个合成门店下
pub const DEFAULT_STORE_ID: i64 = 1;

/// 金额在 JSON 中输出为数字而不是字符串
pub fn as_number<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.to_f64().unwrap_or_default())
}

/// 收据主表 (receipts)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Receipt {
    pub id: i64,
    pub store_id: i64,
    pub store_name: String,
    pub purchase_date: DateTime<Utc>,
    #[serde(serialize_with = "as_number")]
    pub total_amount: BigDecimal,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 收据明细表 (receipt_items)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub id: i64,
    pub receipt_id: i64,
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "as_number")]
    pub quantity: BigDecimal,
    #[serde(serialize_with = "as_number")]
    pub unit_price: BigDecimal,
    #[serde(serialize_with = "as_number")]
    pub total_price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待入库的收据
#[derive(Debug, Clone, PartialEq)]
pub struct NewReceipt {
    pub store_id: i64,
    pub store_name: String,
    pub purchase_date: DateTime<Utc>,
    pub total_amount: BigDecimal,
    pub image_path: String,
}

impl NewReceipt {
    pub fn new(image_path: &str) -> Self {
        Self {
            store_id: DEFAULT_STORE_ID,
            store_name: "Unknown Store".to_string(),
            purchase_date: Utc::now(),
            total_amount: BigDecimal::zero(),
            image_path: image_path.to_string(),
        }
    }
}

/// 待入库的明细
#[derive(Debug, Clone, PartialEq)]
pub struct NewReceiptItem {
    pub name: String,
    pub description: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
}

impl Default for NewReceiptItem {
    fn default() -> Self {
        Self {
            name: "Unknown Item".to_string(),
            description: String::new(),
            quantity: BigDecimal::from(1),
            unit_price: BigDecimal::zero(),
            total_price: BigDecimal::zero(),
        }
    }
}

impl NewReceiptItem {
    /// 由另外两个值补齐缺失的单价或总价 (单价优先)
    ///
    /// 只做补齐，不校验：两者都非零时即使不满足 单价×数量=总价 也保持原样
    pub fn reconcile_prices(&mut self) {
        let zero = BigDecimal::zero();
        if self.unit_price.is_zero() && self.quantity > zero && self.total_price > zero {
            self.unit_price = (&self.total_price / &self.quantity).with_scale(4);
        } else if self.total_price.is_zero() && self.unit_price > zero && self.quantity > zero {
            self.total_price = &self.unit_price * &self.quantity;
        }
    }
}

/// 识别结果：一张收据 + 按出现顺序排列的明细
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedReceipt {
    pub receipt: NewReceipt,
    pub items: Vec<NewReceiptItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(quantity: &str, unit_price: &str, total_price: &str) -> NewReceiptItem {
        NewReceiptItem {
            quantity: BigDecimal::from_str(quantity).unwrap(),
            unit_price: BigDecimal::from_str(unit_price).unwrap(),
            total_price: BigDecimal::from_str(total_price).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn derives_unit_price_from_total() {
        let mut it = item("2", "0", "10");
        it.reconcile_prices();
        assert_eq!(it.unit_price, BigDecimal::from(5));
        assert_eq!(it.total_price, BigDecimal::from(10));
    }

    #[test]
    fn derives_total_from_unit_price() {
        let mut it = item("3", "4", "0");
        it.reconcile_prices();
        assert_eq!(it.total_price, BigDecimal::from(12));
        assert_eq!(it.unit_price, BigDecimal::from(4));
    }

    #[test]
    fn all_zero_stays_zero() {
        let mut it = item("0", "0", "0");
        it.reconcile_prices();
        assert!(it.quantity.is_zero());
        assert!(it.unit_price.is_zero());
        assert!(it.total_price.is_zero());
    }

    #[test]
    fn inconsistent_prices_are_left_alone() {
        let mut it = item("2", "3", "10");
        it.reconcile_prices();
        assert_eq!(it.unit_price, BigDecimal::from(3));
        assert_eq!(it.total_price, BigDecimal::from(10));
    }

    #[test]
    fn non_terminating_division_is_truncated() {
        let mut it = item("3", "0", "10");
        it.reconcile_prices();
        assert_eq!(it.unit_price, BigDecimal::from_str("3.3333").unwrap());
    }

    #[test]
    fn amounts_serialize_as_numbers() {
        let now = Utc::now();
        let item = ReceiptItem {
            id: 1,
            receipt_id: 2,
            name: "Milk".into(),
            description: String::new(),
            quantity: BigDecimal::from(2),
            unit_price: BigDecimal::from_str("4.5").unwrap(),
            total_price: BigDecimal::from(9),
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["quantity"], serde_json::json!(2.0));
        assert_eq!(value["unit_price"], serde_json::json!(4.5));
        assert_eq!(value["total_price"], serde_json::json!(9.0));
    }

    #[test]
    fn item_defaults() {
        let it = NewReceiptItem::default();
        assert_eq!(it.name, "Unknown Item");
        assert_eq!(it.description, "");
        assert_eq!(it.quantity, BigDecimal::from(1));
    }
}
