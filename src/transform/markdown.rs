//! Markdown 转换与样板清理

use std::sync::OnceLock;

use htmd::HtmlToMarkdown;
use htmd::options::{CodeBlockStyle, HeadingStyle, Options};
use regex::Regex;

use crate::core::error::{Result, ScribeError};

struct BoilerplatePatterns {
    social_lines: Regex,
    trailing_listing: Regex,
    empty_heading: Regex,
    blank_runs: Regex,
}

fn patterns() -> &'static BoilerplatePatterns {
    static PATTERNS: OnceLock<BoilerplatePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| BoilerplatePatterns {
        social_lines: Regex::new(r"(?m)^.*(?:Follow:|Listen:).*$").unwrap(),
        trailing_listing: Regex::new(r"(?i)(?:Recent Posts|See All)[\s\S]*$").unwrap(),
        empty_heading: Regex::new(r"(?m)^#{1,6}[ \t]*$").unwrap(),
        blank_runs: Regex::new(r"\n{3,}").unwrap(),
    })
}

/// HTML → Markdown (ATX 标题、围栏代码块)
pub fn html_to_markdown(html: &str) -> Result<String> {
    let converter = HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            ..Default::default()
        })
        .skip_tags(vec!["script", "style", "noscript"])
        .build();

    converter
        .convert(html)
        .map_err(|e| ScribeError::Custom(format!("Markdown conversion failed: {}", e)))
}

/// 移除社交行、尾部推荐列表与空标题，并压缩空行
pub fn strip_boilerplate(markdown: &str) -> String {
    let p = patterns();
    let text = p.social_lines.replace_all(markdown, "");
    let text = p.trailing_listing.replace(&text, "");
    let text = p.empty_heading.replace_all(&text, "");
    let text = p.blank_runs.replace_all(&text, "\n\n");
    text.trim().to_string()
}
