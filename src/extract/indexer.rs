//! 列表页索引器
//!
//! 负责从列表页发现文章链接

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::core::config::CompiledSelector;
use crate::core::error::{Result, ScribeError};
use crate::interfaces::navigator::{Navigator, OpenOptions, PageSnapshot};

use super::dom::select_all_resolved;

/// 列表页索引器
pub struct PostIndexer {
    link: CompiledSelector,
    options: OpenOptions,
}

impl PostIndexer {
    pub fn new(link: CompiledSelector, options: OpenOptions) -> Self {
        Self { link, options }
    }

    /// 加载列表页并返回去重后的文章地址 (保持首次出现顺序)
    pub async fn discover(&self, navigator: &dyn Navigator, list_url: &str) -> Result<Vec<String>> {
        debug!("Loading listing page {}", list_url);
        let snapshot = navigator.open(list_url, &self.options).await?;
        let links = self.parse_links_html(&snapshot)?;
        info!("Found {} posts", links.len());
        Ok(links)
    }

    /// 解析文章链接，结果为空时视为致命错误
    fn parse_links_html(&self, snapshot: &PageSnapshot) -> Result<Vec<String>> {
        let doc = snapshot.document();
        let links: IndexSet<String> =
            select_all_resolved(&doc, &self.link.selector, "href", &snapshot.url)
                .into_iter()
                .collect();

        if links.is_empty() {
            return Err(ScribeError::NoPostsFound {
                selector: self.link.source.clone(),
            });
        }
        Ok(links.into_iter().collect())
    }
}
