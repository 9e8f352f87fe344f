//! 字段规范化 (List / Boolean Normalization)

use crate::core::model::{FieldValue, PostRecord};

pub const CATEGORIES: &str = "categories";
pub const TAGS: &str = "tags";
pub const DRAFT: &str = "draft";
const DEFAULT_CATEGORY: &str = "news";

/// 规范化 `categories` 与 `tags` 为列表
pub fn normalize_lists(record: &mut PostRecord) {
    let categories = as_list(record.get(CATEGORIES), &[DEFAULT_CATEGORY]);
    record.insert(CATEGORIES.to_string(), FieldValue::List(categories));

    let tags = as_list(record.get(TAGS), &[]);
    record.insert(TAGS.to_string(), FieldValue::List(tags));
}

/// `draft` 缺失时补为 `false`，已有值保持不变
pub fn normalize_draft(record: &mut PostRecord) {
    record
        .entry(DRAFT.to_string())
        .or_insert(FieldValue::Bool(false));
}

/// 非空列表保留；非空文本包装为单元素列表；否则使用默认值
fn as_list(value: Option<&FieldValue>, default: &[&str]) -> Vec<String> {
    match value {
        Some(FieldValue::List(items)) if !items.is_empty() => items.clone(),
        Some(FieldValue::Text(text)) if !text.is_empty() => vec![text.clone()],
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// 布尔字段取值：`Bool(true)` 或文本 `true`
pub fn is_truthy(value: Option<&FieldValue>) -> bool {
    match value {
        Some(FieldValue::Bool(b)) => *b,
        Some(FieldValue::Text(text)) => text.trim() == "true",
        _ => false,
    }
}
