//! 事件系统定义
//!
//! 用于 Engine 与 UI 之间的完全解耦通信

use flume::{Receiver, Sender};

/// Scribe 事件类型
#[derive(Debug, Clone)]
pub enum ScribeEvent {
    /// 转圈指示器开始
    SpinnerStarted { message: String },

    /// 转圈指示器结束
    SpinnerStopped { message: String, success: bool },

    /// 发现文章总数
    PostsDiscovered { total: usize },

    /// 文章处理进度
    PostProgress {
        current: usize,
        total: usize,
        status: String,
    },

    /// 文章写入完成
    PostSaved { index: usize, slug: String },

    /// 文章处理失败
    PostFailed {
        index: usize,
        url: String,
        error: String,
    },

    /// 图片下载进度
    ImageProgress { downloaded: usize, total: usize },

    /// 运行汇总
    RunSummarized {
        saved: usize,
        failed: usize,
        output: String,
    },

    /// 日志消息（用于 UI 显示）
    Log { level: LogLevel, message: String },
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warn,
    Error,
}

/// 事件发送器
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<ScribeEvent>,
}

impl EventSender {
    pub fn new(tx: Sender<ScribeEvent>) -> Self {
        Self { tx }
    }

    /// 发送事件
    pub fn emit(&self, event: ScribeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn spinner_started(&self, message: impl Into<String>) {
        self.emit(ScribeEvent::SpinnerStarted {
            message: message.into(),
        });
    }

    pub fn spinner_stopped(&self, message: impl Into<String>, success: bool) {
        self.emit(ScribeEvent::SpinnerStopped {
            message: message.into(),
            success,
        });
    }

    /// 发送文章进度事件
    pub fn post_progress(&self, current: usize, total: usize, status: impl Into<String>) {
        self.emit(ScribeEvent::PostProgress {
            current,
            total,
            status: status.into(),
        });
    }

    /// 发送日志事件
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(ScribeEvent::Log {
            level,
            message: message.into(),
        });
    }
}

/// 事件接收器
pub struct EventReceiver {
    rx: Receiver<ScribeEvent>,
}

impl EventReceiver {
    pub fn new(rx: Receiver<ScribeEvent>) -> Self {
        Self { rx }
    }

    /// 非阻塞接收事件
    pub fn try_recv(&self) -> Option<ScribeEvent> {
        self.rx.try_recv().ok()
    }

    /// 异步接收事件
    pub async fn recv_async(&self) -> Option<ScribeEvent> {
        self.rx.recv_async().await.ok()
    }
}

/// 创建事件通道
pub fn create_event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = flume::unbounded();
    (EventSender::new(tx), EventReceiver::new(rx))
}
