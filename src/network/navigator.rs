//! 浏览器导航器 (Browser-backed Navigator)
//!
//! 单一浏览器会话在一次运行内复用，按需惰性启动；每次打开页面使用独立的标签页。

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{interval, sleep, timeout};
use tracing::{debug, warn};
use url::Url;

use crate::core::config::BrowserConfig;
use crate::core::error::{Result, ScribeError};
use crate::interfaces::navigator::{Navigator, OpenOptions, PageSnapshot, WaitPolicy};
use crate::network::browser::BrowserSession;

/// 滚动间隔 (每步 100px)
pub const SCROLL_INTERVAL: Duration = Duration::from_millis(100);
/// 距底部的判定容差 (像素)
pub const BOTTOM_TOLERANCE_PX: f64 = 50.0;
/// 连续命中底部的检查次数
pub const BOTTOM_CONFIRMATIONS: u32 = 50;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

const SCROLL_STEP_JS: &str = "window.scrollBy(0, 100), ({ \
    inner_height: window.innerHeight, \
    scroll_y: window.scrollY, \
    scroll_height: document.body ? document.body.scrollHeight : 0 })";

const READY_STATE_JS: &str = "document.readyState";
const RESOURCE_COUNT_JS: &str = "performance.getEntriesByType('resource').length";

/// 单次滚动后的视口度量
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScrollMetrics {
    pub inner_height: f64,
    pub scroll_y: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    fn at_bottom(&self) -> bool {
        self.inner_height + self.scroll_y >= self.scroll_height - BOTTOM_TOLERANCE_PX
    }
}

/// 自动滚动状态机
///
/// 连续命中底部指定次数后结束，中途未命中则计数归零；步数达到上限时强制结束。
#[derive(Debug, Clone)]
pub struct AutoScroll {
    max_steps: u32,
    steps: u32,
    bottom_hits: u32,
}

impl AutoScroll {
    pub fn new(max_steps: u32) -> Self {
        Self {
            max_steps,
            steps: 0,
            bottom_hits: 0,
        }
    }

    /// 记录一次滚动结果，返回是否应继续滚动
    pub fn observe(&mut self, metrics: ScrollMetrics) -> bool {
        self.steps += 1;
        if metrics.at_bottom() {
            self.bottom_hits += 1;
        } else {
            self.bottom_hits = 0;
        }
        !self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.bottom_hits >= BOTTOM_CONFIRMATIONS || self.steps >= self.max_steps
    }

    pub fn reached_bottom(&self) -> bool {
        self.bottom_hits >= BOTTOM_CONFIRMATIONS
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }
}

/// 基于 Chromium 的导航器实现
pub struct BrowserNavigator {
    config: BrowserConfig,
    session: Mutex<Option<BrowserSession>>,
}

impl BrowserNavigator {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    fn navigation_error(url: &str, reason: impl ToString) -> ScribeError {
        ScribeError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    async fn load(&self, page: &Page, url: &str, wait: WaitPolicy) -> Result<()> {
        page.goto(url)
            .await
            .map_err(|e| Self::navigation_error(url, e))?;

        let mut ticker = interval(POLL_INTERVAL);
        loop {
            ticker.tick().await;
            let state: String = page
                .evaluate(READY_STATE_JS)
                .await
                .ok()
                .and_then(|v| v.into_value().ok())
                .unwrap_or_default();

            let ready = match wait {
                WaitPolicy::DomContentLoaded => state == "interactive" || state == "complete",
                WaitPolicy::Load | WaitPolicy::NetworkIdle => state == "complete",
            };
            if ready {
                break;
            }
        }

        if wait == WaitPolicy::NetworkIdle {
            self.wait_network_idle(page).await;
        }
        Ok(())
    }

    /// 资源条目数在静默窗口内保持不变即视为网络空闲
    async fn wait_network_idle(&self, page: &Page) {
        let idle = Duration::from_millis(self.config.idle_ms);
        let mut last_count: u64 = 0;
        let mut stable_for = Duration::ZERO;

        while stable_for < idle {
            sleep(POLL_INTERVAL).await;
            let count: u64 = page
                .evaluate(RESOURCE_COUNT_JS)
                .await
                .ok()
                .and_then(|v| v.into_value().ok())
                .unwrap_or(last_count);

            if count == last_count {
                stable_for += POLL_INTERVAL;
            } else {
                last_count = count;
                stable_for = Duration::ZERO;
            }
        }
    }

    async fn auto_scroll(&self, page: &Page) {
        let mut scroll = AutoScroll::new(self.config.max_scroll_steps);
        let mut ticker = interval(SCROLL_INTERVAL);

        loop {
            ticker.tick().await;
            let metrics = match page.evaluate(SCROLL_STEP_JS).await {
                Ok(v) => match v.into_value::<ScrollMetrics>() {
                    Ok(m) => m,
                    Err(e) => {
                        debug!("Scroll metrics unreadable: {}", e);
                        break;
                    }
                },
                Err(e) => {
                    debug!("Scroll step failed: {}", e);
                    break;
                }
            };
            if !scroll.observe(metrics) {
                break;
            }
        }

        if !scroll.reached_bottom() {
            warn!("Auto-scroll stopped after {} steps without settling at the bottom", scroll.steps());
        } else {
            debug!("Auto-scroll settled after {} steps", scroll.steps());
        }
    }

    async fn capture(&self, page: &Page, requested: &str, options: &OpenOptions) -> Result<PageSnapshot> {
        timeout(options.timeout, self.load(page, requested, options.wait))
            .await
            .map_err(|_| {
                Self::navigation_error(
                    requested,
                    format!("timed out after {}ms", options.timeout.as_millis()),
                )
            })??;

        if options.auto_scroll {
            self.auto_scroll(page).await;
        }

        let html = page
            .content()
            .await
            .map_err(|e| Self::navigation_error(requested, e))?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok());
        let url = match final_url {
            Some(u) => u,
            None => Url::parse(requested).map_err(|e| Self::navigation_error(requested, e))?,
        };

        Ok(PageSnapshot::new(url, html))
    }
}

#[async_trait]
impl Navigator for BrowserNavigator {
    async fn open(&self, url: &str, options: &OpenOptions) -> Result<PageSnapshot> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            let session = BrowserSession::launch(&self.config)
                .await
                .map_err(|e| Self::navigation_error(url, e))?;
            *guard = Some(session);
        }
        let session = guard
            .as_ref()
            .ok_or_else(|| Self::navigation_error(url, "browser session unavailable"))?;

        let page = session
            .new_page()
            .await
            .map_err(|e| Self::navigation_error(url, e))?;
        debug!("Opening {} (wait: {})", url, options.wait);

        let result = self.capture(&page, url, options).await;
        if let Err(e) = page.close().await {
            debug!("Page close warning: {}", e);
        }
        result
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.session.lock().await;
        if let Some(mut session) = guard.take() {
            session.close().await?;
            debug!("Browser session closed");
        }
        Ok(())
    }
}
