//! 图片本地化 (Image Localization)

use std::path::Path;

use tracing::{debug, warn};

use crate::core::model::{ContentPayload, FieldValue, ImageDownloadTask, PostRecord, Slug};
use crate::network::downloader::{DownloadRequest, Downloader};
use crate::utils::is_http_url;

pub const HERO_FIELD: &str = "image";

/// 下载主图并将字段替换为发布路径；失败时保留远程地址
pub async fn localize_hero(
    record: &mut PostRecord,
    slug: &Slug,
    downloader: &Downloader,
    output_root: &Path,
) {
    let url = match record.get(HERO_FIELD).and_then(FieldValue::as_text) {
        Some(url) if is_http_url(url) => url.to_string(),
        _ => return,
    };

    let task = ImageDownloadTask::hero(&url, slug, output_root);
    match downloader
        .fetch(&task.source_url, &task.local_directory, &task.local_filename)
        .await
    {
        Ok(_) => {
            record.insert(HERO_FIELD.to_string(), FieldValue::Text(task.published_path));
        }
        Err(e) => warn!("Hero image kept remote ({}): {}", url, e),
    }
}

/// 批量下载正文图片并改写正文中的地址；非 HTTP(S) 图片保持原样
pub async fn localize_body(
    payload: &ContentPayload,
    slug: &Slug,
    downloader: &Downloader,
    output_root: &Path,
    progress: impl FnMut(usize, usize),
) -> String {
    let tasks: Vec<ImageDownloadTask> = payload
        .images
        .iter()
        .filter(|img| is_http_url(&img.source_url))
        .map(|img| ImageDownloadTask::content(img, slug, output_root))
        .collect();

    if tasks.is_empty() {
        return payload.body.clone();
    }

    let requests: Vec<DownloadRequest> = tasks
        .iter()
        .map(|t| DownloadRequest {
            url: t.source_url.clone(),
            filename: t.local_filename.clone(),
        })
        .collect();

    let outcomes = downloader
        .fetch_all(&requests, &slug.image_dir(output_root), progress)
        .await;

    let mut body = payload.body.clone();
    for (task, outcome) in tasks.iter().zip(&outcomes) {
        match &outcome.path {
            Some(path) if outcome.success => {
                debug!("Body image {} -> {}", outcome.filename, path.display());
                body = replace_url(&body, &task.source_url, &task.published_path);
            }
            _ => debug!("Body image left remote: {}", outcome.url),
        }
    }
    body
}

/// 替换地址的字面形式及其 `&amp;` 转义形式
fn replace_url(body: &str, url: &str, published: &str) -> String {
    let body = body.replace(url, published);
    let escaped = url.replace('&', "&amp;");
    if escaped == url {
        body
    } else {
        body.replace(&escaped, published)
    }
}
