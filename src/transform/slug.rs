//! Slug 推导 (Slug Derivation)

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::core::model::{PostRecord, Slug, text_field};

fn numbered_post() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^post-\d+$").unwrap())
}

/// 小写、音译为 ASCII (transliterate)、连字符连接
///
/// `&` 读作 `and`，撇号直接删除，其余符号视为分隔。
pub fn slugify(text: &str) -> String {
    let text = text.replace('&', " and ").replace(['\'', '\u{2019}'], "");
    ::slugify::slugify(&text, "", "-", None)
}

/// 来源地址的最后一个非空路径段
fn last_segment(source_url: &str) -> Option<String> {
    let url = Url::parse(source_url).ok()?;
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// 由标题 (或 `name`) 与来源地址推导 slug
pub fn derive_slug(record: &PostRecord, source_url: &str) -> Slug {
    derive_slug_with(record, source_url, || chrono::Utc::now().timestamp_millis())
}

pub(crate) fn derive_slug_with(
    record: &PostRecord,
    source_url: &str,
    now_millis: impl FnOnce() -> i64,
) -> Slug {
    let title = text_field(record, "title").trim();
    let source = if title.is_empty() {
        text_field(record, "name").trim()
    } else {
        title
    };

    let segment = last_segment(source_url);
    let mut slug = slugify(source);
    if slug.is_empty() {
        // 标题存在但无法音译时借用地址段，时间戳只用于二者皆空
        slug = match &segment {
            Some(seg) if !source.is_empty() => seg.clone(),
            _ => format!("post-{}", now_millis()),
        };
    }

    if let Some(segment) = segment {
        if numbered_post().is_match(&segment) {
            slug = segment;
        } else if segment != slug && !slug.contains(segment.as_str()) {
            slug = format!("{}-{}", slug, segment);
        }
    }

    Slug::new(slug)
}
