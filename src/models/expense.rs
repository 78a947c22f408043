use aws_sdk_textract::types as textract;

/// 一个被识别出的字段：语义类型 + 识别文本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseField {
    pub field_type: Option<String>,
    pub value: Option<String>,
}

/// 一行明细 (若干字段)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItem {
    pub fields: Vec<ExpenseField>,
}

/// 明细分组
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItemGroup {
    pub line_items: Vec<LineItem>,
}

/// AnalyzeExpense 返回的单个费用文档
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseDocument {
    pub summary_fields: Vec<ExpenseField>,
    pub line_item_groups: Vec<LineItemGroup>,
}

impl ExpenseField {
    pub fn new(field_type: &str, value: &str) -> Self {
        Self {
            field_type: Some(field_type.to_string()),
            value: Some(value.to_string()),
        }
    }

    /// 类型和值都存在时返回 (类型, 值)
    pub fn tagged(&self) -> Option<(&str, &str)> {
        Some((self.field_type.as_deref()?, self.value.as_deref()?))
    }
}

impl From<&textract::ExpenseField> for ExpenseField {
    fn from(field: &textract::ExpenseField) -> Self {
        Self {
            field_type: field.r#type.as_ref().and_then(|t| t.text.clone()),
            value: field.value_detection.as_ref().and_then(|v| v.text.clone()),
        }
    }
}

impl From<&textract::LineItemFields> for LineItem {
    fn from(item: &textract::LineItemFields) -> Self {
        Self {
            fields: item
                .line_item_expense_fields
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(ExpenseField::from)
                .collect(),
        }
    }
}

impl From<&textract::LineItemGroup> for LineItemGroup {
    fn from(group: &textract::LineItemGroup) -> Self {
        Self {
            line_items: group
                .line_items
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(LineItem::from)
                .collect(),
        }
    }
}

impl From<&textract::ExpenseDocument> for ExpenseDocument {
    fn from(doc: &textract::ExpenseDocument) -> Self {
        Self {
            summary_fields: doc
                .summary_fields
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(ExpenseField::from)
                .collect(),
            line_item_groups: doc
                .line_item_groups
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(LineItemGroup::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_textract_document() {
        let total = textract::ExpenseField::builder()
            .r#type(textract::ExpenseType::builder().text("TOTAL").build())
            .value_detection(textract::ExpenseDetection::builder().text("$9.99").build())
            .build();
        let untyped = textract::ExpenseField::builder()
            .value_detection(textract::ExpenseDetection::builder().text("noise").build())
            .build();
        let item_name = textract::ExpenseField::builder()
            .r#type(textract::ExpenseType::builder().text("ITEM").build())
            .value_detection(textract::ExpenseDetection::builder().text("Milk").build())
            .build();
        let doc = textract::ExpenseDocument::builder()
            .summary_fields(total)
            .summary_fields(untyped)
            .line_item_groups(
                textract::LineItemGroup::builder()
                    .line_items(
                        textract::LineItemFields::builder()
                            .line_item_expense_fields(item_name)
                            .build(),
                    )
                    .build(),
            )
            .build();

        let converted = ExpenseDocument::from(&doc);

        assert_eq!(converted.summary_fields.len(), 2);
        assert_eq!(converted.summary_fields[0].tagged(), Some(("TOTAL", "$9.99")));
        assert_eq!(converted.summary_fields[1].tagged(), None);
        assert_eq!(
            converted.line_item_groups[0].line_items[0].fields[0],
            ExpenseField::new("ITEM", "Milk")
        );
    }
}
