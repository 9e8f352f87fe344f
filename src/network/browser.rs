//! 浏览器会话 (Chromium Session)
//!
//! 负责 Chromium 进程的启动、页面分配与确定性关闭。

use std::path::Path;

use chromiumoxide::{
    Page,
    browser::{Browser, BrowserConfig as ChromeConfig},
};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::config::BrowserConfig;
use crate::core::error::{Result, ScribeError};

/// 浏览器会话
/// 采用显式的所有权管理，确保关闭逻辑的确定性
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
}

impl BrowserSession {
    /// 启动浏览器会话
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let chrome_config = build_chrome_config(config)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| ScribeError::Browser(e.to_string()))?;

        // 启动事件循环
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        debug!("Browser session launched (headless: {})", config.headless);

        Ok(Self {
            browser: Some(browser),
            handler: Some(handle),
        })
    }

    /// 创建新页面
    pub async fn new_page(&self) -> Result<Page> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScribeError::Browser("Browser already closed".into()))?;

        browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScribeError::Browser(e.to_string()))
    }

    /// 优雅关闭浏览器，并等待事件循环结束
    pub async fn close(&mut self) -> Result<()> {
        let browser = self.browser.take();
        let handler = self.handler.take();

        if let Some(mut b) = browser {
            let _ = b.close().await;
            if let Some(h) = handler {
                let _ = h.await;
            }
        }
        Ok(())
    }
}

/// 构建 Chromium 启动参数
fn build_chrome_config(config: &BrowserConfig) -> Result<ChromeConfig> {
    let mut builder = ChromeConfig::builder()
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--no-sandbox")
        .arg("--window-size=1920,1080")
        .arg("--disable-extensions")
        .request_timeout(config.timeout());

    if let Some(ua) = &config.user_agent {
        builder = builder.arg(format!("--user-agent={}", ua));
    }

    if config.headless {
        builder = builder.arg("--headless=new");
    } else {
        builder = builder.with_head();
    }

    let chrome_path = config.chrome_path.clone().or_else(|| {
        [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ]
        .iter()
        .find(|p| Path::new(p).exists())
        .map(|p| p.to_string())
    });

    if let Some(path) = chrome_path {
        builder = builder.chrome_executable(path);
    }

    builder.build().map_err(ScribeError::Browser)
}

// 在 Drop 时尝试最后一次保护，但不报 WARN
impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            let handler = self.handler.take();
            // 在后台清理
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    let _ = browser.close().await;
                    if let Some(h) = handler {
                        let _ = h.await;
                    }
                });
            }
        }
    }
}
