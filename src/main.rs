//! 应用程序入口 (Application Entrypoint)
//!
//! 负责 CLI 指令解析、遥测层初始化、依赖注入及系统生命周期管理。

mod core;
mod engine;
mod extract;
mod interfaces;
mod network;
mod transform;
mod ui;
mod utils;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::core::config::{AppConfig, FieldSelectorMap, SelectorConfig};
use crate::core::event::create_event_channel;
use crate::core::template::Template;
use crate::engine::{RuntimeContext, ScrapeEngine};
use crate::network::{BrowserNavigator, Downloader, HttpService};
use crate::ui::{Ui, get_multi};

/// 进度条感知的日志写入器 (TUI-aware Log Writer)
///
/// 确保非同步日志输出不会破坏终端进度条的渲染布局。
struct IndicatifWriter;

impl io::Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let _ = get_multi().println(s.trim_end());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&self) -> Self::Writer {
        IndicatifWriter
    }
}

/// 命令行界面脚手架 (CLI Scaffolding)
#[derive(Parser)]
#[command(author, version, about = "Scrape a blog listing into Markdown posts", long_about = None)]
struct Cli {
    /// 列表页地址
    url: String,
    /// Front Matter 模板文件
    template: PathBuf,
    /// 选择器配置 (JSON)
    #[arg(short = 'c', long)]
    selectors: PathBuf,
    /// 输出目录
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
    /// 无头模式
    #[arg(long)]
    headless: Option<bool>,
    /// 单次导航超时 (毫秒)
    #[arg(long)]
    timeout: Option<u64>,
    /// 资源下载重试次数
    #[arg(long)]
    retry: Option<u32>,
}

impl Cli {
    /// 在配置文件之上叠加命令行覆盖项
    fn apply(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(headless) = self.headless {
            config.browser.headless = headless;
        }
        if let Some(timeout) = self.timeout {
            config.browser.timeout_ms = timeout;
        }
        if let Some(retry) = self.retry {
            config.download.max_retries = retry;
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(IndicatifWriter)
        .with_target(false)
        .with_ansi(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // 依赖项初始化与注入 (Dependency Injection)
    let mut config = AppConfig::load()?;
    cli.apply(&mut config);

    let template = Template::load(&cli.template)?;
    let selectors = FieldSelectorMap::from_config(&SelectorConfig::load(&cli.selectors)?)?;
    tracing::debug!("Template fields: {}", template.len());

    let downloader = Downloader::new(HttpService::new(&config.download)?, &config.download);
    let navigator = Arc::new(BrowserNavigator::new(config.browser.clone()));

    // 建立 UI 事件反馈链路 (Event feedback loop)
    let (event_sender, event_receiver) = create_event_channel();
    let ui_handle = Ui::run(event_receiver);

    // 信号处理与优雅退出 (Signal Handling)
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current post");
            signal.cancel();
        }
    });

    // 任务域限制 (Scope isolation so the UI loop sees the channel close)
    let result = {
        let engine = ScrapeEngine::new(navigator, &selectors, template, downloader, &config)
            .with_context(RuntimeContext::new(Some(event_sender), shutdown));
        engine.run(&cli.url).await
    };

    let _ = ui_handle.await;

    // 引擎已记录失败原因，这里只负责退出码
    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
