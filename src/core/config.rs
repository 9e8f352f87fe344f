//! 配置管理系统 (Configuration Management)
//!
//! 负责 `config.toml` 的反序列化及其层级结构映射，支持默认值回退机制；
//! 同时承载外部选择器文档 (`postLinkSelector` / `contentSelector` / `fm_*`) 的加载与校验。

use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use config::{Config, File};
use indexmap::IndexMap;
use scraper::Selector;
use serde::Deserialize;

use crate::core::error::{Result, ScribeError};
use crate::interfaces::navigator::WaitPolicy;

/// 全局应用配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct AppConfig {
    /// 输出根目录 (Markdown 与图片)
    #[serde(default = "default_output_dir")]
    #[builder(default = default_output_dir())]
    pub output_dir: PathBuf,

    /// 自动化浏览器 (Chromium) 相关配置
    #[serde(default)]
    #[builder(default)]
    pub browser: BrowserConfig,

    /// 资源下载参数
    #[serde(default)]
    #[builder(default)]
    pub download: DownloadConfig,
}

/// 浏览器引擎配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct BrowserConfig {
    /// 是否以无头模式 (Headless) 运行
    #[serde(default = "default_headless")]
    #[builder(default = default_headless())]
    pub headless: bool,
    /// 自定义可执行文件路径
    pub chrome_path: Option<String>,
    /// 单次导航超时 (毫秒)
    #[serde(default = "default_page_timeout_ms")]
    #[builder(default = default_page_timeout_ms())]
    pub timeout_ms: u64,
    /// 覆盖浏览器 User-Agent
    pub user_agent: Option<String>,
    /// 列表页等待策略
    #[serde(default = "default_list_wait")]
    #[builder(default = default_list_wait())]
    pub list_wait: WaitPolicy,
    /// 详情页等待策略
    #[serde(default = "default_detail_wait")]
    #[builder(default = default_detail_wait())]
    pub detail_wait: WaitPolicy,
    /// 网络静默判定窗口 (毫秒)
    #[serde(default = "default_idle_ms")]
    #[builder(default = default_idle_ms())]
    pub idle_ms: u64,
    /// 自动滚动的硬性步数上限
    #[serde(default = "default_max_scroll_steps")]
    #[builder(default = default_max_scroll_steps())]
    pub max_scroll_steps: u32,
}

/// 下载器参数
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct DownloadConfig {
    /// 失败后的最大重试次数
    #[serde(default = "default_max_retries")]
    #[builder(default = default_max_retries())]
    pub max_retries: u32,
    /// 单请求超时 (毫秒)
    #[serde(default = "default_download_timeout_ms")]
    #[builder(default = default_download_timeout_ms())]
    pub timeout_ms: u64,
    /// 线性退避基准单位 (毫秒)
    #[serde(default = "default_backoff_ms")]
    #[builder(default = default_backoff_ms())]
    pub backoff_ms: u64,
    /// 最大重定向次数
    #[serde(default = "default_max_redirects")]
    #[builder(default = default_max_redirects())]
    pub max_redirects: usize,
    /// 下载请求使用的 User-Agent
    #[serde(default = "default_user_agent")]
    #[builder(default = default_user_agent())]
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            browser: BrowserConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            timeout_ms: default_page_timeout_ms(),
            user_agent: None,
            list_wait: default_list_wait(),
            detail_wait: default_detail_wait(),
            idle_ms: default_idle_ms(),
            max_scroll_steps: default_max_scroll_steps(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_ms: default_download_timeout_ms(),
            backoff_ms: default_backoff_ms(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

impl BrowserConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_headless() -> bool {
    true
}
fn default_page_timeout_ms() -> u64 {
    60_000
}
fn default_list_wait() -> WaitPolicy {
    WaitPolicy::NetworkIdle
}
fn default_detail_wait() -> WaitPolicy {
    WaitPolicy::DomContentLoaded
}
fn default_idle_ms() -> u64 {
    500
}
fn default_max_scroll_steps() -> u32 {
    600
}
fn default_max_retries() -> u32 {
    3
}
fn default_download_timeout_ms() -> u64 {
    30_000
}
fn default_backoff_ms() -> u64 {
    1_000
}
fn default_max_redirects() -> usize {
    5
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

impl AppConfig {
    /// 从文件系统中加载并解析配置
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let builder = Config::builder();

        let builder = if config_path.exists() {
            builder.add_source(File::from(config_path))
        } else {
            builder
        };

        let settings = builder.build().map_err(ScribeError::Config)?;
        settings.try_deserialize().map_err(ScribeError::Config)
    }
}

// =============================================================================
// 选择器文档 (Selector Document)
// =============================================================================

pub const POST_LINK_SELECTOR: &str = "postLinkSelector";
pub const CONTENT_SELECTOR: &str = "contentSelector";
const FIELD_PREFIX: &str = "fm_";

/// 外部提供的原始选择器文档
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SelectorConfig {
    entries: IndexMap<String, String>,
}

impl SelectorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScribeError::InvalidConfig(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    #[cfg(test)]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// 校验必填项，缺失时一次性列出全部键名
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [POST_LINK_SELECTOR, CONTENT_SELECTOR]
            .into_iter()
            .filter(|key| self.get(key).is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScribeError::InvalidConfig(format!(
                "Missing required config fields: {}",
                missing.join(", ")
            )))
        }
    }
}

/// 已编译的选择器
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    pub source: String,
    pub selector: Selector,
}

impl CompiledSelector {
    pub fn parse(source: &str) -> Result<Self> {
        let selector = Selector::parse(source).map_err(|e| ScribeError::Selector {
            selector: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }
}

/// 逻辑字段名 → 选择器 映射 (构造后不可变)
#[derive(Debug, Clone)]
pub struct FieldSelectorMap {
    pub post_link: CompiledSelector,
    pub content: CompiledSelector,
    fields: IndexMap<String, CompiledSelector>,
}

impl FieldSelectorMap {
    /// 校验并编译全部选择器；空值视为未配置
    pub fn from_config(config: &SelectorConfig) -> Result<Self> {
        config.validate()?;

        let post_link = CompiledSelector::parse(config.get(POST_LINK_SELECTOR).unwrap_or_default())?;
        let content = CompiledSelector::parse(config.get(CONTENT_SELECTOR).unwrap_or_default())?;

        let mut fields = IndexMap::new();
        for (key, _) in &config.entries {
            if let Some(name) = key.strip_prefix(FIELD_PREFIX)
                && let Some(source) = config.get(key)
            {
                fields.insert(name.to_string(), CompiledSelector::parse(source)?);
            }
        }

        Ok(Self {
            post_link,
            content,
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Option<&CompiledSelector> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_selectors_are_listed_together() {
        let cfg = SelectorConfig::from_pairs([("fm_title", "h1")]);
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("postLinkSelector, contentSelector"), "{}", err);
    }

    #[test]
    fn blank_field_selectors_are_not_configured() {
        let cfg = SelectorConfig::from_pairs([
            ("postLinkSelector", "a.post"),
            ("contentSelector", "article"),
            ("fm_title", "h1.title"),
            ("fm_author", "   "),
        ]);
        let map = FieldSelectorMap::from_config(&cfg).unwrap();
        assert_eq!(map.field("title").map(|s| s.source.as_str()), Some("h1.title"));
        assert!(map.field("author").is_none());
        assert_eq!(map.post_link.source, "a.post");
    }

    #[test]
    fn invalid_selector_is_rejected_up_front() {
        let cfg = SelectorConfig::from_pairs([
            ("postLinkSelector", "a.post"),
            ("contentSelector", "article"),
            ("fm_title", "h1[["),
        ]);
        let err = FieldSelectorMap::from_config(&cfg).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn selector_document_is_read_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selectors.json");
        std::fs::write(
            &path,
            r#"{"postLinkSelector": "a.card", "fm_title": "h1", "contentSelector": ".body"}"#,
        )
        .unwrap();
        let cfg = SelectorConfig::load(&path).unwrap();
        assert_eq!(cfg.get("postLinkSelector"), Some("a.card"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn malformed_selector_document_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selectors.json");
        std::fs::write(&path, r#"{"postLinkSelector": "a.card","#).unwrap();
        let err = SelectorConfig::load(&path).unwrap_err();
        assert!(matches!(err, ScribeError::Serialization(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("output"));
        assert_eq!(cfg.download.max_retries, 3);
        assert_eq!(cfg.browser.detail_wait, WaitPolicy::DomContentLoaded);
    }

    #[test]
    fn toml_overrides_nested_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "output_dir = \"site/content\"\n[download]\nmax_retries = 5\n[browser]\nlist_wait = \"load\"\n",
        )
        .unwrap();
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("site/content"));
        assert_eq!(cfg.download.max_retries, 5);
        assert_eq!(cfg.download.backoff_ms, 1_000);
        assert_eq!(cfg.browser.list_wait, WaitPolicy::Load);
    }
}
