//! Front Matter 渲染

use crate::core::model::{FieldValue, PostRecord};
use crate::core::template::{FieldShape, Template};

use super::normalize::{CATEGORIES, DRAFT, TAGS, is_truthy};

/// 按模板字段顺序渲染 `---` 包裹的头部块 (末尾附带空行)
pub fn render(record: &PostRecord, template: &Template) -> String {
    let mut out = String::from("---\n");
    for key in template.field_names() {
        let shape = template.shape(key);
        let value = record.get(key);
        let rendered = if shape == FieldShape::Array || key == CATEGORIES || key == TAGS {
            render_list(value)
        } else if shape == FieldShape::Boolean || key == DRAFT {
            is_truthy(value).to_string()
        } else {
            render_string(value)
        };
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&rendered);
        out.push('\n');
    }
    out.push_str("---\n\n");
    out
}

fn render_list(value: Option<&FieldValue>) -> String {
    let items: Vec<String> = match value {
        Some(FieldValue::List(items)) => items.clone(),
        Some(FieldValue::Text(text)) if !text.is_empty() => vec![text.clone()],
        Some(FieldValue::Bool(true)) => vec!["true".to_string()],
        _ => Vec::new(),
    };
    serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string())
}

fn render_string(value: Option<&FieldValue>) -> String {
    let text = match value {
        Some(FieldValue::Text(text)) => text.clone(),
        Some(FieldValue::List(items)) => items.join(", "),
        Some(FieldValue::Bool(b)) => b.to_string(),
        None => String::new(),
    };
    // YAML 双引号串内的反斜杠需成对出现才能原样读回
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
