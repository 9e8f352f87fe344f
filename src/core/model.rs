use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// 图片发布路径前缀 (与输出根目录的实际位置无关)
pub const PUBLISHED_IMAGE_ROOT: &str = "/images/news";

/// 单个字段的提取值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Bool(bool),
}

impl FieldValue {
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Bool(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// 单篇文章的字段记录，键顺序与模板一致
pub type PostRecord = IndexMap<String, FieldValue>;

/// 读取文本字段，缺失或非文本时返回空串
pub fn text_field<'a>(record: &'a PostRecord, name: &str) -> &'a str {
    record
        .get(name)
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
}

/// 正文图片引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub source_url: String,
    /// 清洗后正文中的零基文档序号
    pub index: usize,
}

/// 清洗后的正文及其图片列表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPayload {
    pub body: String,
    pub images: Vec<ImageRef>,
}

/// 文章 Slug
///
/// 只能由 slug 推导流程构造，所有路径均从同一实例派生。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 本地图片目录 `<root>/images/news/<slug>`
    pub fn image_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join("images").join("news").join(&self.0)
    }

    /// 对外发布路径 `/images/news/<slug>/<filename>`
    pub fn published_path(&self, filename: &str) -> String {
        format!("{}/{}/{}", PUBLISHED_IMAGE_ROOT, self.0, filename)
    }

    /// 输出文件 `<root>/<slug>.md`
    pub fn markdown_path(&self, output_root: &Path) -> PathBuf {
        output_root.join(format!("{}.md", self.0))
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 图片下载任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDownloadTask {
    pub source_url: String,
    pub local_filename: String,
    pub local_directory: PathBuf,
    pub published_path: String,
}

impl ImageDownloadTask {
    fn for_file(source_url: &str, filename: String, slug: &Slug, output_root: &Path) -> Self {
        Self {
            source_url: source_url.to_string(),
            local_directory: slug.image_dir(output_root),
            published_path: slug.published_path(&filename),
            local_filename: filename,
        }
    }

    /// 主图：`hero.<ext>`
    pub fn hero(source_url: &str, slug: &Slug, output_root: &Path) -> Self {
        let filename = format!("hero{}", crate::utils::url_extension(source_url));
        Self::for_file(source_url, filename, slug, output_root)
    }

    /// 正文图：`content-<index>.<ext>`
    pub fn content(image: &ImageRef, slug: &Slug, output_root: &Path) -> Self {
        let filename = format!(
            "content-{}{}",
            image.index,
            crate::utils::url_extension(&image.source_url)
        );
        Self::for_file(&image.source_url, filename, slug, output_root)
    }
}

/// 运行期成功/失败计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    pub saved: usize,
    pub failed: usize,
}

impl RunTally {
    pub fn record_success(&mut self) {
        self.saved += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> usize {
        self.saved + self.failed
    }
}
