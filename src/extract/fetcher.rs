//! 详情页提取器
//!
//! 负责单篇文章的字段提取与正文清洗

use tracing::{debug, warn};

use crate::core::config::CompiledSelector;
use crate::core::error::Result;
use crate::core::model::{ContentPayload, PostRecord, text_field};
use crate::interfaces::navigator::{Navigator, OpenOptions, PageSnapshot};

use super::content;
use super::dom::select_inner_html;
use super::strategy::ExtractionPlan;

/// 详情页提取器
pub struct PostFetcher {
    plan: ExtractionPlan,
    content: CompiledSelector,
    options: OpenOptions,
}

impl PostFetcher {
    pub fn new(plan: ExtractionPlan, content: CompiledSelector, options: OpenOptions) -> Self {
        Self {
            plan,
            content,
            options,
        }
    }

    pub async fn fetch(
        &self,
        navigator: &dyn Navigator,
        url: &str,
    ) -> Result<(PostRecord, ContentPayload)> {
        debug!("Scraping {}...", url);
        let snapshot = navigator.open(url, &self.options).await?;
        self.parse_post_html(&snapshot)
    }

    fn parse_post_html(&self, snapshot: &PageSnapshot) -> Result<(PostRecord, ContentPayload)> {
        let doc = snapshot.document();
        let record = self.plan.extract_fields(&doc, &snapshot.url);

        let payload = match select_inner_html(&doc, &self.content.selector) {
            Some(markup) => content::clean(&markup, text_field(&record, "title"), &snapshot.url)?,
            None => {
                warn!(
                    "Content selector `{}` matched nothing on {}",
                    self.content.source, snapshot.url
                );
                ContentPayload::default()
            }
        };

        debug!(
            "Extracted {} fields and {} images from {}",
            record.len(),
            payload.images.len(),
            snapshot.url
        );
        Ok((record, payload))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::core::config::{FieldSelectorMap, SelectorConfig};
    use crate::core::model::FieldValue;
    use crate::interfaces::navigator::WaitPolicy;

    const POST: &str = r#"<html><body>
        <h1 class="title">Big News Today</h1>
        <article class="body">
            <h1>Big News Today</h1>
            <div class="meta">Mar 5, 2024 · 4 min read</div>
            <p>First paragraph.</p>
            <img src="/uploads/a.png">
        </article>
    </body></html>"#;

    fn fetcher(content_selector: &str) -> PostFetcher {
        let cfg = SelectorConfig::from_pairs([
            ("postLinkSelector", "a"),
            ("contentSelector", content_selector),
            ("fm_title", "h1.title"),
        ]);
        let map = FieldSelectorMap::from_config(&cfg).unwrap();
        let plan = ExtractionPlan::new(&map, ["title", "date"]);
        PostFetcher::new(
            plan,
            map.content.clone(),
            OpenOptions {
                wait: WaitPolicy::DomContentLoaded,
                timeout: Duration::from_secs(1),
                auto_scroll: false,
            },
        )
    }

    fn snapshot() -> PageSnapshot {
        PageSnapshot::new(Url::parse("https://blog.example.com/blog/post-7/").unwrap(), POST)
    }

    #[test]
    fn body_is_cleaned_using_extracted_title() {
        let (record, payload) = fetcher("article.body").parse_post_html(&snapshot()).unwrap();
        assert_eq!(record["title"], FieldValue::from("Big News Today"));
        assert_eq!(record["date"], FieldValue::from(""));
        assert!(!payload.body.contains("<h1>"));
        assert!(!payload.body.contains("min read"));
        assert!(payload.body.contains("First paragraph."));
        assert_eq!(payload.images.len(), 1);
        assert_eq!(payload.images[0].source_url, "https://blog.example.com/uploads/a.png");
    }

    #[test]
    fn missing_content_root_yields_empty_payload() {
        let (record, payload) = fetcher("section.nope").parse_post_html(&snapshot()).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(payload, ContentPayload::default());
    }
}
