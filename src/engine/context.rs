//! 引擎运行时上下文 (Runtime Context)
//!
//! 维护一次运行内共享的事件句柄与中断信号。

use tokio_util::sync::CancellationToken;

use crate::core::event::{EventSender, LogLevel, ScribeEvent};

/// 运行时上下文
#[derive(Clone, Default)]
pub struct RuntimeContext {
    /// 事件分发句柄
    pub events: Option<EventSender>,
    /// 中断信号 (Ctrl-C)
    pub shutdown: CancellationToken,
}

impl RuntimeContext {
    pub fn new(events: Option<EventSender>, shutdown: CancellationToken) -> Self {
        Self { events, shutdown }
    }

    /// 向事件总线推送消息
    pub fn emit(&self, event: ScribeEvent) {
        if let Some(ref sender) = self.events {
            sender.emit(event);
        }
    }

    pub fn spinner_started(&self, message: impl Into<String>) {
        if let Some(ref sender) = self.events {
            sender.spinner_started(message);
        }
    }

    pub fn spinner_stopped(&self, message: impl Into<String>, success: bool) {
        if let Some(ref sender) = self.events {
            sender.spinner_stopped(message, success);
        }
    }

    pub fn post_progress(&self, current: usize, total: usize, status: impl Into<String>) {
        if let Some(ref sender) = self.events {
            sender.post_progress(current, total, status);
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if let Some(ref sender) = self.events {
            sender.log(level, message);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
