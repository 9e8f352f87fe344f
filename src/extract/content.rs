//! 正文清洗 (Content Cleanup)
//!
//! 清洗由一组有序、具名的纯函数组成，每个函数接收上一步的标记并返回新的标记；
//! 全部完成后收集图片并将 `<img src>` 改写为绝对地址。

use std::sync::OnceLock;

use lol_html::{HtmlRewriter, Settings, element};
use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

use crate::core::error::{Result, ScribeError};
use crate::core::model::{ContentPayload, ImageRef};
use crate::utils::to_absolute_url;

use super::dom::rendered_text;
use super::selectors::PageSelectors;

/// 清洗过程的只读上下文
#[derive(Debug, Clone)]
pub struct PassContext {
    /// 已规范化 (去空白、小写) 的文章标题
    title: String,
}

impl PassContext {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.trim().to_lowercase(),
        }
    }
}

pub type CleanupFn = fn(&str, &PassContext) -> String;

/// 具名清洗步骤
pub struct CleanupPass {
    pub name: &'static str,
    pub apply: CleanupFn,
}

/// 清洗顺序：标题去重必须先于元数据扫描
pub const PASSES: &[CleanupPass] = &[
    CleanupPass {
        name: "strip-duplicate-title",
        apply: strip_duplicate_title,
    },
    CleanupPass {
        name: "strip-leading-metadata",
        apply: strip_leading_metadata,
    },
    CleanupPass {
        name: "strip-reading-time-list",
        apply: strip_reading_time_list,
    },
    CleanupPass {
        name: "strip-filler-text",
        apply: strip_filler_text,
    },
];

/// 元数据扫描的直接子元素数量
const LEADING_ELEMENTS: usize = 5;
const READ_TIME_MAX_LEN: usize = 300;
const DATE_LINE_MAX_LEN: usize = 100;
const READ_TIME_MARKER: &str = "min read";

fn date_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z]{3} \d{1,2}, \d{4}").unwrap())
}

fn filler_text() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)this is just to fill empty area of this tag").unwrap())
}

/// 清洗正文标记并收集图片
pub fn clean(markup: &str, title: &str, base: &Url) -> Result<ContentPayload> {
    let ctx = PassContext::new(title);
    let cleaned = PASSES
        .iter()
        .fold(markup.to_string(), |acc, pass| (pass.apply)(&acc, &ctx));
    collect_images(&cleaned, base)
}

/// 解析片段，移除选中的元素并重新序列化；无命中时原样返回
fn prune(markup: &str, ctx: &PassContext, pick: for<'a> fn(&'a Html, &PassContext) -> Vec<ElementRef<'a>>) -> String {
    let mut doc = Html::parse_fragment(markup);
    let ids: Vec<_> = pick(&doc, ctx).into_iter().map(|el| el.id()).collect();
    if ids.is_empty() {
        return markup.to_string();
    }
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
    doc.root_element().inner_html()
}

fn strip_duplicate_title(markup: &str, ctx: &PassContext) -> String {
    if ctx.title.is_empty() {
        return markup.to_string();
    }
    prune(markup, ctx, |doc, ctx| {
        doc.select(&PageSelectors::get().heading)
            .filter(|h| {
                let text = rendered_text(*h).to_lowercase();
                text == ctx.title || ctx.title.contains(&text)
            })
            .collect()
    })
}

fn strip_leading_metadata(markup: &str, ctx: &PassContext) -> String {
    prune(markup, ctx, |doc, _| {
        doc.root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .take(LEADING_ELEMENTS)
            .filter(|el| {
                let text = rendered_text(*el).to_lowercase();
                let len = text.chars().count();
                (text.contains(READ_TIME_MARKER) && len < READ_TIME_MAX_LEN)
                    || (date_line().is_match(&text) && len < DATE_LINE_MAX_LEN)
            })
            .collect()
    })
}

fn strip_reading_time_list(markup: &str, ctx: &PassContext) -> String {
    prune(markup, ctx, |doc, _| {
        doc.select(&PageSelectors::get().list)
            .find(|ul| rendered_text(*ul).to_lowercase().contains(READ_TIME_MARKER))
            .into_iter()
            .collect()
    })
}

fn strip_filler_text(markup: &str, _ctx: &PassContext) -> String {
    filler_text().replace_all(markup, "").into_owned()
}

/// 按文档顺序收集图片，并将 `src` 改写为绝对地址
///
/// 每个 `<img>` 都占用一个序号，`src` 为空时记为空串。
fn collect_images(markup: &str, base: &Url) -> Result<ContentPayload> {
    let mut output = Vec::with_capacity(markup.len());
    let mut images = Vec::new();

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("img", |el| {
                let raw = el
                    .get_attribute("src")
                    .map(|s| s.replace("&amp;", "&"))
                    .unwrap_or_default();
                let source_url = to_absolute_url(base, &raw);
                if !source_url.is_empty() && source_url != raw {
                    el.set_attribute("src", &source_url)?;
                }
                images.push(ImageRef {
                    source_url,
                    index: images.len(),
                });
                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(markup.as_bytes())
        .map_err(|e| ScribeError::Rewrite(e.to_string()))?;
    rewriter
        .end()
        .map_err(|e| ScribeError::Rewrite(e.to_string()))?;

    let body = String::from_utf8(output).map_err(|e| ScribeError::Rewrite(e.to_string()))?;
    Ok(ContentPayload { body, images })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://blog.example.com/blog/post-7/").unwrap()
    }

    #[test]
    fn duplicate_title_heading_is_removed() {
        let ctx = PassContext::new("  Big News Today ");
        let out = strip_duplicate_title("<h1>big news today</h1><h1>News</h1><h1>Other</h1><p>Body</p>", &ctx);
        assert!(!out.contains("big news today"));
        assert!(!out.contains("<h1>News</h1>"));
        assert!(out.contains("<h1>Other</h1>"));
        assert!(out.contains("<p>Body</p>"));
    }

    #[test]
    fn empty_title_keeps_headings() {
        let ctx = PassContext::new("");
        let markup = "<h1>Anything</h1><p>x</p>";
        assert_eq!(strip_duplicate_title(markup, &ctx), markup);
    }

    #[test]
    fn leading_metadata_is_stripped_only_near_the_top() {
        let ctx = PassContext::new("");
        let markup = "<div>5 min read</div><p>Mar 5, 2024</p><p>Intro</p><p>a</p><p>b</p><p>2 min read later</p>";
        let out = strip_leading_metadata(markup, &ctx);
        assert!(!out.contains("<div>5 min read</div>"));
        assert!(!out.contains("Mar 5, 2024"));
        assert!(out.contains("<p>Intro</p>"));
        assert!(out.contains("2 min read later"));
    }

    #[test]
    fn long_blocks_survive_metadata_scan() {
        let ctx = PassContext::new("");
        let long = format!("<p>min read {}</p>", "x".repeat(400));
        assert_eq!(strip_leading_metadata(&long, &ctx), long);
    }

    #[test]
    fn only_first_reading_time_list_is_removed() {
        let ctx = PassContext::new("");
        let markup = "<p>x</p><ul><li>3 min read</li></ul><ul><li>4 min read</li></ul>";
        let out = strip_reading_time_list(markup, &ctx);
        assert!(!out.contains("3 min read"));
        assert!(out.contains("4 min read"));
    }

    #[test]
    fn filler_text_is_removed_case_insensitively() {
        let ctx = PassContext::new("");
        let out = strip_filler_text("<p>This is just to fill empty area of this tag</p>", &ctx);
        assert_eq!(out, "<p></p>");
    }

    #[test]
    fn images_are_indexed_in_document_order_and_absolutized() {
        let payload = clean(
            r#"<p><img src="/a.png"></p><img src=""><img src="https://cdn.example.com/c.jpg?x=1&amp;y=2">"#,
            "",
            &base(),
        )
        .unwrap();

        assert_eq!(payload.images.len(), 3);
        assert_eq!(payload.images[0].source_url, "https://blog.example.com/a.png");
        assert_eq!(payload.images[1].source_url, "");
        assert_eq!(payload.images[2].index, 2);
        assert_eq!(payload.images[2].source_url, "https://cdn.example.com/c.jpg?x=1&y=2");
        assert!(payload.body.contains("https://blog.example.com/a.png"));
    }

    #[test]
    fn passes_run_in_declared_order() {
        let names: Vec<_> = PASSES.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            [
                "strip-duplicate-title",
                "strip-leading-metadata",
                "strip-reading-time-list",
                "strip-filler-text"
            ]
        );
    }
}
