//! 错误处理体系 (Error Handling System)
//!
//! 定义领域相关的错误类型、致命/可恢复分级以及全局 Result 别名。

use reqwest::StatusCode;
use thiserror::Error;

/// 全局错误定义 (Scribe Domain Errors)
#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    /// 页面导航超时或浏览器会话无法建立
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// 列表页未发现任何文章链接，运行无意义
    #[error("No posts found with the provided selector: {selector}")]
    NoPostsFound { selector: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("HTML rewrite error: {0}")]
    Rewrite(String),

    #[error("Other error: {0}")]
    Custom(String),
}

/// 全局 Result 别名
pub type Result<T> = std::result::Result<T, ScribeError>;

impl ScribeError {
    /// 判定错误是否终止整个运行
    ///
    /// 序列化类错误只来自启动时的配置与模板解析。其余错误均限定在单篇文章或单个资源范围内。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScribeError::NoPostsFound { .. }
                | ScribeError::InvalidUrl(_)
                | ScribeError::Template(_)
                | ScribeError::InvalidConfig(_)
                | ScribeError::Config(_)
                | ScribeError::Selector { .. }
                | ScribeError::Serialization(_)
                | ScribeError::Yaml(_)
        )
    }

    /// 从中间件嵌套错误中解包 HTTP 状态码
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ScribeError::Status { status, .. } => Some(*status),
            ScribeError::Network(e) => e.status(),
            ScribeError::Middleware(reqwest_middleware::Error::Middleware(inner)) => inner
                .downcast_ref::<ScribeError>()
                .and_then(ScribeError::status),
            ScribeError::Middleware(reqwest_middleware::Error::Reqwest(e)) => e.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_aborting_errors_are_fatal() {
        assert!(ScribeError::NoPostsFound { selector: "a.post".into() }.is_fatal());
        assert!(ScribeError::InvalidUrl("nope".into()).is_fatal());
        assert!(ScribeError::Template("missing".into()).is_fatal());
        assert!(!ScribeError::Browser("crashed".into()).is_fatal());
        assert!(
            !ScribeError::Navigation {
                url: "https://example.com".into(),
                reason: "timeout".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn status_is_unwrapped_from_middleware_errors() {
        let inner = ScribeError::Status {
            url: "https://example.com/a.png".into(),
            status: StatusCode::NOT_FOUND,
        };
        let err = ScribeError::Middleware(reqwest_middleware::Error::Middleware(
            anyhow::Error::new(inner),
        ));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }
}
