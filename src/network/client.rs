//! 抓取传输层实现
//!
//! 引擎侧只看到 `PageSource`；重试、退避、编码解码与超时都收敛在这里。

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use tracing::debug;

use crate::core::config::{EngineConfig, SiteConfig};
use crate::core::error::{GrabError, Result};
use crate::interfaces::PageSource;

/// 默认桌面浏览器 UA
const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/86.0.4240.75 Safari/537.36";

/// 面向站点的 HTTP 客户端封装
pub struct PageClient {
    client: reqwest::Client,
    encoding: &'static Encoding,
    retry_count: u32,
    retry_delay: Duration,
}

impl PageClient {
    pub fn new(engine: &EngineConfig, site: &SiteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &site.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| GrabError::Custom(format!("Invalid cookie header: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_UA)
            .default_headers(headers)
            .timeout(Duration::from_secs(engine.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(GrabError::Fetch)?;

        // 未知编码标签回退 utf-8，与未配置时行为一致
        let encoding = site
            .encoding
            .as_deref()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);

        Ok(Self {
            client,
            encoding,
            retry_count: engine.retry_count,
            retry_delay: Duration::from_millis(engine.retry_delay_ms),
        })
    }

    /// 执行带重试的 GET 请求
    ///
    /// 网络错误与非 2xx 都会消耗重试预算；预算耗尽后错误原样上抛。
    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            let result = async {
                let resp = self.client.get(url).send().await?;
                resp.error_for_status()
            }
            .await;

            match result {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < self.retry_count => {
                    attempt += 1;
                    debug!("请求失败, 第 {} 次重试: {} ({})", attempt, url, e);
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(GrabError::Fetch(e)),
            }
        }
    }
}

#[async_trait]
impl PageSource for PageClient {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let resp = self.get_with_retry(url).await?;
        let bytes = resp.bytes().await.map_err(GrabError::Fetch)?;
        let (text, _, _) = self.encoding.decode(&bytes);
        Ok(text.into_owned())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<(Bytes, Option<String>)> {
        let resp = self.get_with_retry(url).await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await.map_err(GrabError::Fetch)?;
        Ok((bytes, content_type))
    }
}
