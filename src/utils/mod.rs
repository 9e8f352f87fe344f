use std::path::Path;

use tokio::fs;
use url::Url;

pub fn to_absolute_url(base: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    if let Some(path_without_slashes) = href.strip_prefix("//") {
        return format!("{}://{}", base.scheme(), path_without_slashes);
    }

    if is_http_url(href) {
        return href.to_string();
    }

    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// 是否为绝对 HTTP(S) 地址
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// 提取 URL 路径的扩展名 (含点号)，缺失时回退为 `.jpg`
pub fn url_extension(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(u) => u.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let file = path.rsplit('/').next().unwrap_or_default();
    match file.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < file.len() => file[idx..].to_string(),
        _ => ".jpg".to_string(),
    }
}

pub async fn file_exists(path: impl AsRef<Path>) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

pub async fn save_file(path: impl AsRef<Path>, data: &[u8]) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, data).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links_resolve_against_page() {
        let base = Url::parse("https://blog.example.com/news/index.html").unwrap();
        assert_eq!(
            to_absolute_url(&base, "/blog/post-7/"),
            "https://blog.example.com/blog/post-7/"
        );
        assert_eq!(
            to_absolute_url(&base, "//cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(to_absolute_url(&base, "  "), "");
    }

    #[test]
    fn extension_ignores_query_and_defaults_to_jpg() {
        assert_eq!(url_extension("https://cdn.example.com/a.png?x=1"), ".png");
        assert_eq!(url_extension("https://cdn.example.com/dir.v2/photo"), ".jpg");
        assert_eq!(url_extension("https://cdn.example.com/?img=1.png"), ".jpg");
        assert_eq!(url_extension("https://cdn.example.com/.hidden"), ".jpg");
    }

    #[test]
    fn only_http_schemes_count_as_remote() {
        assert!(is_http_url("https://cdn.example.com/a.png"));
        assert!(is_http_url("http://cdn.example.com/a.png"));
        assert!(!is_http_url("data:image/png;base64,AAAA"));
        assert!(!is_http_url("/images/news/x/hero.jpg"));
    }
}
