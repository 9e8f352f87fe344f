//! 快照查询 (Snapshot Queries)
//!
//! 所有查询在未命中时返回 `None` 或空集合，是否致命由调用方决定。

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::utils::to_absolute_url;

/// 元素的渲染文本：合并空白并去除首尾空白
pub fn rendered_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn first<'a>(doc: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    doc.select(selector).next()
}

/// 首个匹配元素的渲染文本
pub fn select_text(doc: &Html, selector: &Selector) -> Option<String> {
    first(doc, selector)
        .map(rendered_text)
        .filter(|s| !s.is_empty())
}

/// 首个匹配元素的属性原值
pub fn select_attr(doc: &Html, selector: &Selector, attr: &str) -> Option<String> {
    first(doc, selector)
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 首个匹配元素的链接属性 (按页面地址解析为绝对地址)
pub fn select_resolved(doc: &Html, selector: &Selector, attr: &str, base: &Url) -> Option<String> {
    select_attr(doc, selector, attr)
        .map(|v| to_absolute_url(base, &v))
        .filter(|v| !v.is_empty())
}

/// 全部匹配元素的链接属性，按文档顺序，空值已剔除
pub fn select_all_resolved(doc: &Html, selector: &Selector, attr: &str, base: &Url) -> Vec<String> {
    doc.select(selector)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| to_absolute_url(base, v))
        .filter(|v| !v.is_empty())
        .collect()
}

/// 首个匹配元素的内部标记
pub fn select_inner_html(doc: &Html, selector: &Selector) -> Option<String> {
    first(doc, selector).map(|el| el.inner_html())
}
