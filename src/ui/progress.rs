//! 终端进度渲染引擎 (Terminal UI Progress Engine)
//!
//! 基于 `indicatif` 实现非阻塞式进度条编排，列表发现使用转圈指示器，逐篇处理使用进度条。

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::event::{EventReceiver, LogLevel, ScribeEvent};

/// 全局 TUI 容器 (Singleton)
static MULTI: OnceLock<MultiProgress> = OnceLock::new();

/// 获取全局进度容器实例
pub fn get_multi() -> &'static MultiProgress {
    MULTI.get_or_init(MultiProgress::new)
}

/// TUI 状态容器
pub struct UiState {
    /// 列表页转圈指示器
    spinner: Option<ProgressBar>,
    /// 文章处理进度条
    post_bar: Option<ProgressBar>,
}

impl UiState {
    fn new() -> Self {
        Self {
            spinner: None,
            post_bar: None,
        }
    }
}

static STATE: OnceLock<Arc<RwLock<UiState>>> = OnceLock::new();

fn get_state() -> &'static Arc<RwLock<UiState>> {
    STATE.get_or_init(|| Arc::new(RwLock::new(UiState::new())))
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
}

/// 进度协调器 (Progress Orchestrator)
pub struct Ui;

impl Ui {
    /// 激活事件监听循环，启动异步渲染管线
    pub fn run(receiver: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = receiver.recv_async().await {
                Self::handle_event(event);
            }
        })
    }

    /// 执行 UI 状态转换与渲染更新
    fn handle_event(event: ScribeEvent) {
        let multi = get_multi();
        let state = get_state();
        let mut ui = state.write();

        match event {
            ScribeEvent::SpinnerStarted { message } => {
                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(spinner_style());
                bar.set_message(message);
                bar.enable_steady_tick(Duration::from_millis(100));
                ui.spinner = Some(bar);
            }
            ScribeEvent::SpinnerStopped { message, success } => {
                if let Some(bar) = ui.spinner.take() {
                    if success {
                        bar.finish_with_message(format!("✅ {}", message));
                    } else {
                        bar.abandon_with_message(format!("❌ {}", message));
                    }
                }
            }
            ScribeEvent::PostsDiscovered { total } => {
                let bar = multi.add(ProgressBar::new(total as u64));
                bar.set_style(bar_style());
                ui.post_bar = Some(bar);
            }
            ScribeEvent::PostProgress { current, total, status } => {
                if let Some(ref bar) = ui.post_bar {
                    bar.set_length(total as u64);
                    bar.set_position(current.saturating_sub(1) as u64);
                    bar.set_message(status);
                }
            }
            ScribeEvent::PostSaved { index, slug } => {
                if let Some(ref bar) = ui.post_bar {
                    bar.set_position(index as u64);
                    bar.set_message(truncate_string(&slug, 30));
                }
            }
            ScribeEvent::PostFailed { index, url, error } => {
                if let Some(ref bar) = ui.post_bar {
                    bar.set_position(index as u64);
                    bar.set_message(format!(
                        "⚠️ {} ({})",
                        truncate_string(&url, 40),
                        truncate_string(&error, 40)
                    ));
                }
            }
            ScribeEvent::ImageProgress { downloaded, total } => {
                if let Some(ref bar) = ui.post_bar {
                    bar.set_message(format!("Downloading images {}/{}", downloaded, total));
                }
            }
            ScribeEvent::RunSummarized { saved, failed, output } => {
                if let Some(bar) = ui.post_bar.take() {
                    if failed == 0 {
                        bar.finish_with_message(format!("✅ {} saved to {}", saved, output));
                    } else {
                        bar.finish_with_message(format!(
                            "⚠️ {} saved to {}, {} failed",
                            saved, output, failed
                        ));
                    }
                }
            }
            ScribeEvent::Log { level: LogLevel::Error, message } => {
                if let Some(bar) = ui.post_bar.take() {
                    bar.abandon_with_message(format!("❌ FAILED: {}", message));
                }
            }
            ScribeEvent::Log { .. } => {}
        }
    }
}

/// 执行语义化字符串截断
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
