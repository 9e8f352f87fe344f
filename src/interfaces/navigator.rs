//! 页面导航接口 (Page Navigator Seam)
//!
//! 引擎与提取器只依赖此 Trait，浏览器实现位于 `network::navigator`。

use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;
use serde::Deserialize;
use url::Url;

use crate::core::error::Result;

/// 导航等待策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WaitPolicy {
    /// `load` 事件触发
    Load,
    /// DOM 解析完成
    DomContentLoaded,
    /// 网络静默 (一段时间内无新资源请求)
    NetworkIdle,
}

/// 单次页面打开参数
#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub wait: WaitPolicy,
    pub timeout: Duration,
    /// 是否执行自动滚动以触发懒加载内容
    pub auto_scroll: bool,
}

/// 渲染完成后的页面快照
///
/// 结构化查询针对快照执行，对实时页面无副作用。
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// 导航结束后的最终地址 (用于解析相对链接)
    pub url: Url,
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// 页面导航器
#[async_trait]
pub trait Navigator: Send + Sync {
    /// 打开页面并按策略等待，超时或会话无法建立时返回 `Navigation` 错误
    async fn open(&self, url: &str, options: &OpenOptions) -> Result<PageSnapshot>;

    /// 释放底层会话，可重复调用
    async fn close(&self) -> Result<()>;
}
