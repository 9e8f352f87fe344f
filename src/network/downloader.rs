//! 资源下载器 (Resource Downloader)
//!
//! 流式写入 `.part` 临时文件，成功后原子重命名；失败时按线性退避重试。

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::core::config::DownloadConfig;
use crate::core::error::Result;
use crate::network::service::HttpService;

/// 单个下载请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub filename: String,
}

/// 下载结果，与请求列表按位置一一对应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub url: String,
    pub filename: String,
    pub success: bool,
    pub path: Option<PathBuf>,
}

pub struct Downloader {
    http: HttpService,
    max_retries: u32,
    backoff: Duration,
}

impl Downloader {
    pub fn new(http: HttpService, config: &DownloadConfig) -> Self {
        Self {
            http,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// 第 n 次重试前的等待时长
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.backoff * retry
    }

    /// 下载单个资源到 `dir/filename`
    ///
    /// 目标文件已存在时直接返回，不发起网络请求。
    pub async fn fetch(&self, url: &str, dir: &Path, filename: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(filename);

        if crate::utils::file_exists(&path).await {
            debug!("Skipping existing file: {}", path.display());
            return Ok(path);
        }

        let mut attempt = 0;
        loop {
            match self.try_fetch(url, dir, &path).await {
                Ok(()) => {
                    debug!("Downloaded {} -> {}", url, path.display());
                    return Ok(path);
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        error!("Failed to download {} after {} retries: {}", url, self.max_retries, e);
                        return Err(e);
                    }
                    attempt += 1;
                    match e.status() {
                        Some(status) => warn!(
                            "Retry {}/{} for {} (HTTP {})",
                            attempt, self.max_retries, filename, status
                        ),
                        None => warn!("Retry {}/{} for {}: {}", attempt, self.max_retries, filename, e),
                    }
                    tokio::time::sleep(self.backoff_delay(attempt)).await;
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str, dir: &Path, path: &Path) -> Result<()> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = dir.join(format!("{}.part", filename));

        let result = self.stream_to(url, &part).await;
        match result {
            Ok(()) => {
                tokio::fs::rename(&part, path).await?;
                Ok(())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &str, part: &Path) -> Result<()> {
        let resp = self.http.client().get(url).send().await?;

        let mut file = tokio::fs::File::create(part).await?;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    /// 顺序下载一批资源
    ///
    /// 单个失败不会中断批次；每完成一项回调一次 `(已完成数, 总数)`。
    pub async fn fetch_all(
        &self,
        requests: &[DownloadRequest],
        dir: &Path,
        mut progress: impl FnMut(usize, usize),
    ) -> Vec<DownloadOutcome> {
        let total = requests.len();
        let mut outcomes = Vec::with_capacity(total);

        for (done, request) in requests.iter().enumerate() {
            let path = self.fetch(&request.url, dir, &request.filename).await.ok();
            outcomes.push(DownloadOutcome {
                url: request.url.clone(),
                filename: request.filename.clone(),
                success: path.is_some(),
                path,
            });
            progress(done + 1, total);
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloader(max_retries: u32) -> Downloader {
        let config = DownloadConfig {
            max_retries,
            backoff_ms: 1,
            ..DownloadConfig::default()
        };
        let http = HttpService::new(&config).unwrap();
        Downloader::new(http, &config)
    }

    #[tokio::test]
    async fn writes_body_and_leaves_no_part_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/a.png")
            .with_status(200)
            .with_body("PNGDATA")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("images");
        let path = downloader(0)
            .fetch(&format!("{}/a.png", server.url()), &target, "content-0.png")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(std::fs::read(&path).unwrap(), b"PNGDATA");
        assert!(!target.join("content-0.png.part").exists());
    }

    #[tokio::test]
    async fn existing_file_skips_the_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/hero.jpg").expect(0).create_async().await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hero.jpg"), b"cached").unwrap();

        let path = downloader(3)
            .fetch(&format!("{}/hero.jpg", server.url()), dir.path(), "hero.jpg")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(std::fs::read(path).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn failures_are_retried_then_reported() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing.png")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = downloader(2)
            .fetch(&format!("{}/missing.png", server.url()), dir.path(), "x.png")
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
        assert!(!dir.path().join("x.png").exists());
    }

    #[tokio::test]
    async fn batch_outcomes_are_positional() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/one.png")
            .with_status(200)
            .with_body("1")
            .create_async()
            .await;
        let _gone = server
            .mock("GET", "/two.png")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let requests = vec![
            DownloadRequest {
                url: format!("{}/one.png", server.url()),
                filename: "content-0.png".into(),
            },
            DownloadRequest {
                url: format!("{}/two.png", server.url()),
                filename: "content-1.png".into(),
            },
        ];

        let mut ticks = Vec::new();
        let outcomes = downloader(0)
            .fetch_all(&requests, dir.path(), |done, total| ticks.push((done, total)))
            .await;

        assert_eq!(ticks, [(1, 2), (2, 2)]);
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].filename, "content-0.png");
        assert!(!outcomes[1].success);
        assert!(outcomes[1].path.is_none());
    }

    #[test]
    fn backoff_grows_linearly() {
        let config = DownloadConfig::default();
        let d = Downloader::new(HttpService::new(&config).unwrap(), &config);
        assert_eq!(d.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(d.backoff_delay(3), Duration::from_secs(3));
    }
}
