//! 请求中间件 (Request Middleware)

use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::debug;

use crate::core::error::ScribeError;

/// 状态码守卫中间件
/// 负责将非 2xx 响应统一上报为 `ScribeError::Status`，由下载器决定是否重试
pub struct StatusGuardMiddleware;

#[async_trait::async_trait]
impl Middleware for StatusGuardMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let url = req.url().to_string();
        let resp = next.run(req, extensions).await?;

        let status = resp.status();
        if !status.is_success() {
            debug!("HTTP {} for {}", status, url);
            return Err(reqwest_middleware::Error::from(anyhow::Error::new(
                ScribeError::Status { url, status },
            )));
        }

        Ok(resp)
    }
}
