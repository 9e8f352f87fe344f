//! 字段提取策略 (Field Extraction Strategies)
//!
//! 每个模板字段在构建提取计划时一次性确定策略，并展开为有序的取值来源链，
//! 首个非空结果胜出。

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::core::config::FieldSelectorMap;
use crate::core::model::{FieldValue, PostRecord};

use super::dom::{select_attr, select_resolved, select_text};
use super::selectors::PageSelectors;

/// 字段提取策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum FieldStrategy {
    PlainText,
    Image,
    Date,
}

impl FieldStrategy {
    /// 按字段名 (不区分大小写) 判定策略
    pub fn for_field(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("image") || name.contains("thumb") {
            FieldStrategy::Image
        } else if name.contains("date") {
            FieldStrategy::Date
        } else {
            FieldStrategy::PlainText
        }
    }
}

/// 单个取值来源
#[derive(Debug, Clone)]
pub enum ValueSource {
    /// 元素渲染文本
    Text(Selector),
    /// 元素 `src` 属性 (解析为绝对地址)
    ImageSrc(Selector),
    /// 元素 `datetime` 属性
    DateTimeAttr(Selector),
    /// 页面 `og:image` 元标签
    OpenGraphImage,
}

impl ValueSource {
    pub fn read(&self, doc: &Html, base: &Url) -> Option<String> {
        match self {
            ValueSource::Text(sel) => select_text(doc, sel),
            ValueSource::ImageSrc(sel) => select_resolved(doc, sel, "src", base),
            ValueSource::DateTimeAttr(sel) => select_attr(doc, sel, "datetime"),
            ValueSource::OpenGraphImage => {
                select_resolved(doc, &PageSelectors::get().og_image, "content", base)
            }
        }
    }
}

/// 单字段提取计划
#[derive(Debug, Clone)]
pub struct FieldPlan {
    pub name: String,
    pub strategy: FieldStrategy,
    /// 为空表示该字段未配置选择器
    sources: Vec<ValueSource>,
}

impl FieldPlan {
    pub fn new(name: &str, selector: Option<&Selector>) -> Self {
        let strategy = FieldStrategy::for_field(name);
        let sources = match selector {
            None => Vec::new(),
            Some(sel) => match strategy {
                FieldStrategy::Image => {
                    vec![ValueSource::ImageSrc(sel.clone()), ValueSource::OpenGraphImage]
                }
                FieldStrategy::Date => vec![
                    ValueSource::DateTimeAttr(sel.clone()),
                    ValueSource::Text(sel.clone()),
                ],
                FieldStrategy::PlainText => vec![ValueSource::Text(sel.clone())],
            },
        };
        Self {
            name: name.to_string(),
            strategy,
            sources,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn extract(&self, doc: &Html, base: &Url) -> String {
        self.sources
            .iter()
            .find_map(|source| source.read(doc, base))
            .unwrap_or_default()
    }
}

/// 模板全部字段的提取计划
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    fields: Vec<FieldPlan>,
}

impl ExtractionPlan {
    pub fn new<'a>(selectors: &FieldSelectorMap, field_names: impl IntoIterator<Item = &'a str>) -> Self {
        let fields = field_names
            .into_iter()
            .map(|name| FieldPlan::new(name, selectors.field(name).map(|c| &c.selector)))
            .collect();
        Self { fields }
    }

    /// 生成字段记录，记录始终覆盖全部模板字段
    pub fn extract_fields(&self, doc: &Html, base: &Url) -> PostRecord {
        let mut record = PostRecord::new();
        for field in &self.fields {
            let value = if field.is_configured() {
                let value = field.extract(doc, base);
                if value.is_empty() {
                    debug!("Field `{}` ({}) not found on page", field.name, field.strategy);
                }
                FieldValue::Text(value)
            } else {
                FieldValue::empty()
            };
            record.insert(field.name.clone(), value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SelectorConfig;

    const PAGE: &str = r#"<html><head>
        <meta property="og:image" content="/og/cover.png">
    </head><body>
        <h1 class="title">Big News Today</h1>
        <time class="published" datetime="2024-03-05T10:00:00Z">March 5, 2024</time>
        <span class="updated">Mar 9, 2024</span>
        <div class="hero"></div>
        <img class="thumb" src="thumbs/t.jpg">
    </body></html>"#;

    fn plan(pairs: &[(&str, &str)], names: &[&str]) -> ExtractionPlan {
        let mut all = vec![("postLinkSelector", "a"), ("contentSelector", "article")];
        all.extend_from_slice(pairs);
        let map = FieldSelectorMap::from_config(&SelectorConfig::from_pairs(all)).unwrap();
        ExtractionPlan::new(&map, names.iter().copied())
    }

    fn extract(plan: &ExtractionPlan) -> PostRecord {
        let doc = Html::parse_document(PAGE);
        let base = Url::parse("https://blog.example.com/blog/post-7/").unwrap();
        plan.extract_fields(&doc, &base)
    }

    #[test]
    fn strategy_is_resolved_from_field_name() {
        assert_eq!(FieldStrategy::for_field("featuredImage"), FieldStrategy::Image);
        assert_eq!(FieldStrategy::for_field("Thumbnail"), FieldStrategy::Image);
        assert_eq!(FieldStrategy::for_field("pubDate"), FieldStrategy::Date);
        assert_eq!(FieldStrategy::for_field("title"), FieldStrategy::PlainText);
    }

    #[test]
    fn record_covers_every_template_field() {
        let plan = plan(&[("fm_title", "h1.title")], &["title", "author", "draft"]);
        let record = extract(&plan);
        let keys: Vec<_> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["title", "author", "draft"]);
        assert_eq!(record["title"], FieldValue::from("Big News Today"));
        assert!(record["author"].is_empty());
    }

    #[test]
    fn date_prefers_datetime_attribute_then_text() {
        let plan = plan(
            &[("fm_date", "time.published"), ("fm_updatedDate", "span.updated")],
            &["date", "updatedDate"],
        );
        let record = extract(&plan);
        assert_eq!(record["date"], FieldValue::from("2024-03-05T10:00:00Z"));
        assert_eq!(record["updatedDate"], FieldValue::from("Mar 9, 2024"));
    }

    #[test]
    fn image_falls_back_to_open_graph() {
        let plan = plan(
            &[("fm_image", "div.hero"), ("fm_thumb", "img.thumb")],
            &["image", "thumb"],
        );
        let record = extract(&plan);
        assert_eq!(record["image"], FieldValue::from("https://blog.example.com/og/cover.png"));
        assert_eq!(
            record["thumb"],
            FieldValue::from("https://blog.example.com/blog/post-7/thumbs/t.jpg")
        );
    }

    #[test]
    fn unconfigured_image_field_skips_open_graph() {
        let plan = plan(&[], &["image"]);
        assert!(extract(&plan)["image"].is_empty());
    }
}
