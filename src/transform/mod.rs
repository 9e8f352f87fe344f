//! 转换管线 (Transform Pipeline)
//!
//! 将原始字段记录与清洗后的正文按固定顺序加工为最终 Markdown 文档：
//! 列表/布尔规范化 → slug → 日期 → 主图 → 正文图片 → Markdown → 样板清理 → Front Matter。

pub mod date;
pub mod frontmatter;
pub mod images;
pub mod markdown;
pub mod normalize;
pub mod slug;

use std::path::PathBuf;

use tracing::debug;

use crate::core::error::Result;
use crate::core::event::{EventSender, ScribeEvent};
use crate::core::model::{ContentPayload, FieldValue, PostRecord, Slug};
use crate::core::template::Template;
use crate::network::downloader::Downloader;

/// 渲染完成、尚未写盘的文章
#[derive(Debug, Clone)]
pub struct RenderedPost {
    pub slug: Slug,
    pub content: String,
}

pub struct Transformer {
    template: Template,
    downloader: Downloader,
    output_root: PathBuf,
    events: Option<EventSender>,
}

impl Transformer {
    pub fn new(template: Template, downloader: Downloader, output_root: impl Into<PathBuf>) -> Self {
        Self {
            template,
            downloader,
            output_root: output_root.into(),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn transform(
        &self,
        mut record: PostRecord,
        payload: ContentPayload,
        source_url: &str,
    ) -> Result<RenderedPost> {
        normalize::normalize_lists(&mut record);
        normalize::normalize_draft(&mut record);

        // slug 只推导一次，后续路径全部由它派生
        let slug = slug::derive_slug(&record, source_url);
        debug!("Slug for {}: {}", source_url, slug);

        if let Some(FieldValue::Text(raw)) = record.get_mut("date")
            && !raw.is_empty()
        {
            *raw = date::format_date(raw);
        }

        images::localize_hero(&mut record, &slug, &self.downloader, &self.output_root).await;

        let body = images::localize_body(
            &payload,
            &slug,
            &self.downloader,
            &self.output_root,
            |downloaded, total| {
                if let Some(events) = &self.events {
                    events.emit(ScribeEvent::ImageProgress { downloaded, total });
                }
            },
        )
        .await;

        let markdown = markdown::strip_boilerplate(&markdown::html_to_markdown(&body)?);
        let content = format!("{}{}", frontmatter::render(&record, &self.template), markdown);

        Ok(RenderedPost { slug, content })
    }

    /// 写入 `<output>/<slug>.md`
    pub async fn write(&self, post: &RenderedPost) -> Result<PathBuf> {
        let path = post.slug.markdown_path(&self.output_root);
        crate::utils::save_file(&path, post.content.as_bytes()).await?;
        debug!("Saved: {}.md", post.slug);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::core::config::DownloadConfig;
    use crate::core::model::ImageRef;
    use crate::network::service::HttpService;

    const DEMO: &str = "---\ntitle: \"Example\"\ndate: 2024-01-01\nimage: \"\"\ncategories: []\ntags: []\ndraft: false\n---\n";

    fn transformer(root: &Path) -> Transformer {
        let config = DownloadConfig {
            max_retries: 1,
            backoff_ms: 1,
            ..DownloadConfig::default()
        };
        let downloader = Downloader::new(HttpService::new(&config).unwrap(), &config);
        Transformer::new(Template::parse(DEMO).unwrap(), downloader, root)
    }

    #[tokio::test]
    async fn images_are_localized_and_document_rendered() {
        let mut server = mockito::Server::new_async().await;
        let _hero = server
            .mock("GET", "/hero.webp")
            .with_status(200)
            .with_body("HERO")
            .create_async()
            .await;
        let _body = server
            .mock("GET", "/a.png")
            .with_status(200)
            .with_body("A")
            .create_async()
            .await;
        let _gone = server
            .mock("GET", "/gone.png")
            .with_status(404)
            .create_async()
            .await;

        let hero_url = format!("{}/hero.webp", server.url());
        let a_url = format!("{}/a.png", server.url());
        let gone_url = format!("{}/gone.png", server.url());

        let mut record = PostRecord::new();
        record.insert("title".into(), FieldValue::from("Big News Today"));
        record.insert("date".into(), FieldValue::from("2024-03-05"));
        record.insert("image".into(), FieldValue::from(hero_url.as_str()));
        record.insert("categories".into(), FieldValue::empty());
        record.insert("tags".into(), FieldValue::empty());
        record.insert("draft".into(), FieldValue::empty());

        let payload = ContentPayload {
            body: format!(
                r#"<p>Intro</p><img src="data:image/gif;base64,R0l"><img src="{}"><img src="{}"><p>Follow: us</p><h2>Recent Posts</h2><p>other</p>"#,
                a_url, gone_url
            ),
            images: vec![
                ImageRef { source_url: "data:image/gif;base64,R0l".into(), index: 0 },
                ImageRef { source_url: a_url.clone(), index: 1 },
                ImageRef { source_url: gone_url.clone(), index: 2 },
            ],
        };

        let dir = tempfile::tempdir().unwrap();
        let t = transformer(dir.path());
        let post = t
            .transform(record, payload, "https://blog.example.com/blog/post-7/")
            .await
            .unwrap();

        assert_eq!(post.slug.as_str(), "post-7");
        let c = &post.content;
        assert!(c.starts_with("---\ntitle: \"Big News Today\"\n"), "{}", c);
        assert!(c.contains("date: \"2024-03-05T00:00:00.000Z\"\n"), "{}", c);
        assert!(c.contains("image: \"/images/news/post-7/hero.webp\"\n"), "{}", c);
        assert!(c.contains("categories: [\"news\"]\ntags: []\ndraft: false\n---\n\n"), "{}", c);
        assert!(c.contains("/images/news/post-7/content-1.png"), "{}", c);
        assert!(c.contains(&gone_url), "{}", c);
        assert!(!c.contains("Follow:"), "{}", c);
        assert!(!c.contains("other"), "{}", c);

        let images = dir.path().join("images/news/post-7");
        assert_eq!(std::fs::read(images.join("hero.webp")).unwrap(), b"HERO");
        assert!(images.join("content-1.png").exists());
        assert!(!images.join("content-2.png").exists());

        let path = t.write(&post).await.unwrap();
        assert_eq!(path, dir.path().join("post-7.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), post.content);
    }

    #[tokio::test]
    async fn failed_hero_keeps_remote_url() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/hero.jpg")
            .with_status(500)
            .create_async()
            .await;
        let hero_url = format!("{}/hero.jpg", server.url());

        let mut record = PostRecord::new();
        record.insert("title".into(), FieldValue::from("Weekly Update"));
        record.insert("image".into(), FieldValue::from(hero_url.as_str()));

        let dir = tempfile::tempdir().unwrap();
        let post = transformer(dir.path())
            .transform(record, ContentPayload::default(), "https://blog.example.com/blog/weekly-update-42/")
            .await
            .unwrap();

        assert_eq!(post.slug.as_str(), "weekly-update-weekly-update-42");
        assert!(post.content.contains(&format!("image: \"{}\"", hero_url)));
    }
}
