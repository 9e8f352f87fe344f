//! 模板文档解析 (Template Front Matter)
//!
//! 模板头部 `---` 包裹的 YAML 块决定输出字段集合、字段顺序及其声明形态。

use std::path::Path;

use indexmap::IndexMap;
use serde_yml::Value;

use crate::core::error::{Result, ScribeError};

const DELIMITER: &str = "---";

/// 字段声明形态，由模板样例值推断
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FieldShape {
    String,
    Array,
    Boolean,
}

impl FieldShape {
    fn infer(sample: &Value) -> Self {
        match sample {
            Value::Sequence(_) => FieldShape::Array,
            Value::Bool(_) => FieldShape::Boolean,
            _ => FieldShape::String,
        }
    }
}

/// 已解析的模板
#[derive(Debug, Clone)]
pub struct Template {
    fields: IndexMap<String, FieldShape>,
}

impl Template {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScribeError::Template(format!(
                "Demo file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let block = extract_block(content)
            .ok_or_else(|| ScribeError::Template("missing front matter block".into()))?;

        let data: IndexMap<String, Value> = serde_yml::from_str(block)?;

        if data.is_empty() {
            return Err(ScribeError::Template("front matter declares no fields".into()));
        }

        let fields = data
            .iter()
            .map(|(key, sample)| (key.clone(), FieldShape::infer(sample)))
            .collect();

        Ok(Self { fields })
    }

    /// 模板字段名 (保持声明顺序)
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// 未声明的字段按字符串处理
    pub fn shape(&self, name: &str) -> FieldShape {
        self.fields.get(name).copied().unwrap_or(FieldShape::String)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// 截取首部分隔符之间的原始文本
fn extract_block(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some(&content[start..offset]);
        }
        offset += line.len();
    }
    None
}
