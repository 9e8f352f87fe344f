use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

use crate::core::config::DownloadConfig;
use crate::core::error::{Result, ScribeError};
use crate::network::middleware::StatusGuardMiddleware;

/// HTTP 服务
/// 内部客户端共享连接池，克隆开销很小
#[derive(Clone)]
pub struct HttpService {
    client: ClientWithMiddleware,
}

impl HttpService {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = Self::try_build_internal_client(config)?;
        Ok(Self { client })
    }

    /// 构建底层的 HTTP 客户端
    fn try_build_internal_client(config: &DownloadConfig) -> Result<ClientWithMiddleware> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/apng,image/*,*/*;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ScribeError::Network)?;

        Ok(ClientBuilder::new(client).with(StatusGuardMiddleware).build())
    }

    pub fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }
}
