//! 抓取引擎调度器
//!
//! 负责协调一次运行的生命周期：校验 -> 发现 -> 逐篇处理 -> 汇总

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::core::config::{AppConfig, FieldSelectorMap};
use crate::core::error::{Result, ScribeError};
use crate::core::event::{LogLevel, ScribeEvent};
use crate::core::model::{RunTally, Slug};
use crate::core::template::Template;
use crate::extract::{ExtractionPlan, PostFetcher, PostIndexer};
use crate::interfaces::navigator::{Navigator, OpenOptions};
use crate::network::downloader::Downloader;
use crate::transform::Transformer;
use crate::utils::is_http_url;

use super::context::RuntimeContext;

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RunState {
    Idle,
    ListDiscovered,
    ProcessingPosts,
    Summarized,
}

/// 抓取引擎
pub struct ScrapeEngine {
    navigator: Arc<dyn Navigator>,
    indexer: PostIndexer,
    fetcher: PostFetcher,
    transformer: Transformer,
    output_dir: PathBuf,
    ctx: RuntimeContext,
}

impl ScrapeEngine {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        selectors: &FieldSelectorMap,
        template: Template,
        downloader: Downloader,
        config: &AppConfig,
    ) -> Self {
        let timeout = config.browser.timeout();
        let indexer = PostIndexer::new(
            selectors.post_link.clone(),
            OpenOptions {
                wait: config.browser.list_wait,
                timeout,
                auto_scroll: true,
            },
        );

        let plan = ExtractionPlan::new(selectors, template.field_names());
        let fetcher = PostFetcher::new(
            plan,
            selectors.content.clone(),
            OpenOptions {
                wait: config.browser.detail_wait,
                timeout,
                auto_scroll: false,
            },
        );

        let output_dir = config.output_dir.clone();
        Self {
            navigator,
            indexer,
            fetcher,
            transformer: Transformer::new(template, downloader, output_dir.clone()),
            output_dir,
            ctx: RuntimeContext::default(),
        }
    }

    /// 注入事件句柄与中断信号
    pub fn with_context(mut self, ctx: RuntimeContext) -> Self {
        if let Some(events) = ctx.events.clone() {
            self.transformer = self.transformer.with_events(events);
        }
        self.ctx = ctx;
        self
    }

    /// 执行抓取流程
    ///
    /// 无论成功与否，返回前都会释放浏览器会话。
    pub async fn run(&self, list_url: &str) -> Result<RunTally> {
        let result = self.execute(list_url).await;

        if let Err(e) = self.navigator.close().await {
            debug!("Browser close warning: {}", e);
        }

        match &result {
            Ok(tally) => self.finish_run(tally),
            Err(e) => self.fail_run(e),
        }
        result
    }

    async fn execute(&self, list_url: &str) -> Result<RunTally> {
        let mut state = RunState::Idle;

        if !is_http_url(list_url) {
            return Err(ScribeError::InvalidUrl(list_url.to_string()));
        }

        // 1. 文章发现 (Discover)
        let links = self.discover(list_url).await?;
        self.transition(&mut state, RunState::ListDiscovered);

        tokio::fs::create_dir_all(&self.output_dir).await?;

        // 2. 逐篇处理 (Loop)
        let total = links.len();
        self.ctx.emit(ScribeEvent::PostsDiscovered { total });
        self.transition(&mut state, RunState::ProcessingPosts);

        let mut tally = RunTally::default();
        for (i, link) in links.iter().enumerate() {
            if self.ctx.is_cancelled() {
                warn!("Interrupted, skipping {} remaining posts", total - i);
                self.ctx
                    .log(LogLevel::Warn, format!("Interrupted after {} posts", i));
                break;
            }

            let current = i + 1;
            self.ctx
                .post_progress(current, total, format!("Scraping {}/{}", current, total));

            match self.process_post(link).await {
                Ok(slug) => {
                    tally.record_success();
                    self.ctx.emit(ScribeEvent::PostSaved {
                        index: current,
                        slug: slug.to_string(),
                    });
                }
                Err(e) => {
                    tally.record_failure();
                    error!("Failed to process {}: {}", link, e);
                    self.ctx.emit(ScribeEvent::PostFailed {
                        index: current,
                        url: link.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        // 3. 汇总 (Summarize)
        self.transition(&mut state, RunState::Summarized);
        Ok(tally)
    }

    async fn discover(&self, list_url: &str) -> Result<Vec<String>> {
        self.ctx.log(LogLevel::Info, format!("Scraping list page {}", list_url));
        self.ctx.spinner_started("Scraping list page...");
        match self.indexer.discover(self.navigator.as_ref(), list_url).await {
            Ok(links) => {
                self.ctx
                    .spinner_stopped(format!("Found {} posts", links.len()), true);
                Ok(links)
            }
            Err(e) => {
                self.ctx.spinner_stopped("Failed", false);
                Err(e)
            }
        }
    }

    /// 单篇文章：提取 -> 转换 -> 写盘
    async fn process_post(&self, url: &str) -> Result<Slug> {
        let (record, payload) = self.fetcher.fetch(self.navigator.as_ref(), url).await?;
        let post = self.transformer.transform(record, payload, url).await?;
        self.transformer.write(&post).await?;
        Ok(post.slug)
    }

    fn transition(&self, state: &mut RunState, next: RunState) {
        debug!("Run state: {} -> {}", state, next);
        *state = next;
    }

    fn finish_run(&self, tally: &RunTally) {
        let output = self.output_dir.display().to_string();
        info!(
            "Completed! {} of {} posts saved to {}",
            tally.saved,
            tally.total(),
            output
        );
        self.ctx.log(
            LogLevel::Success,
            format!("Completed! {} posts saved to {}", tally.saved, output),
        );
        if tally.failed > 0 {
            warn!("{} posts failed to process", tally.failed);
            self.ctx
                .log(LogLevel::Warn, format!("{} posts failed to process", tally.failed));
        }
        self.ctx.emit(ScribeEvent::RunSummarized {
            saved: tally.saved,
            failed: tally.failed,
            output,
        });
    }

    fn fail_run(&self, e: &ScribeError) {
        if e.is_fatal() {
            error!("Run aborted: {}", e);
        } else {
            error!("Error: {}", e);
        }
        self.ctx.log(LogLevel::Error, e.to_string());
    }
}
