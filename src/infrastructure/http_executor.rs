//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 reqwest Client，只暴露"发送 JSON / 读取 JSON"的能力

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::HttpError;
use crate::infrastructure::CancelToken;
use crate::utils::logging::truncate_text;

/// HTTP 执行器
///
/// 职责：
/// - 持有 Client（连接池）
/// - 每个请求都有超时，并在会话取消时立即放弃
/// - 非 2xx 一律视为失败
/// - 只有 GET 会按退避策略重试，POST 只发一次
/// - 不认识 Question / AnswerRecord
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    timeout: Duration,
    get_max_retries: usize,
    retry_backoff: Duration,
    cancel: CancelToken,
}

impl HttpExecutor {
    /// 根据配置创建执行器
    pub fn new(config: &Config, cancel: CancelToken) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| HttpError::request("reqwest::Client", e))?;

        Ok(Self {
            client,
            timeout: config.request_timeout(),
            get_max_retries: config.get_max_retries,
            retry_backoff: config.retry_backoff(),
            cancel,
        })
    }

    /// 自定义重试策略
    pub fn with_retry(mut self, get_max_retries: usize, retry_backoff: Duration) -> Self {
        self.get_max_retries = get_max_retries;
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// GET 并解析 JSON（幂等，可重试）
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        let mut retries = 0;
        loop {
            let request = self.client.get(url).header(ACCEPT, "application/json");
            match self.execute(url, request).await {
                Ok(body) => return decode(url, &body),
                Err(e) if e.is_retryable() && retries < self.get_max_retries => {
                    retries += 1;
                    let wait = self.backoff_for(retries);
                    warn!(
                        "⚠️ GET {} 失败 (重试 {}/{}), {:?} 后重试: {}",
                        url, retries, self.get_max_retries, wait, e
                    );
                    self.sleep(url, wait).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// POST JSON 并解析 JSON 响应（只发一次）
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.post_json_raw(url, body).await?;
        decode(url, &body)
    }

    /// POST JSON，只关心是否成功（响应正文视为回执，不解析）
    pub async fn post_json_ack<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<(), HttpError> {
        let ack = self.post_json_raw(url, body).await?;
        debug!("{} 回执: {}", url, truncate_text(&ack, 120));
        Ok(())
    }

    /// POST multipart 表单（只发一次）
    pub async fn post_multipart(&self, url: &str, form: Form) -> Result<(), HttpError> {
        let request = self.client.post(url).multipart(form);
        let ack = self.execute(url, request).await?;
        debug!("{} 回执: {}", url, truncate_text(&ack, 120));
        Ok(())
    }

    async fn post_json_raw<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<String, HttpError> {
        let request = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body);
        self.execute(url, request).await
    }

    /// 发送请求并读取正文；超时或取消时放弃
    async fn execute(&self, endpoint: &str, request: RequestBuilder) -> Result<String, HttpError> {
        debug!("→ {}", endpoint);

        let call = async {
            let response = request
                .send()
                .await
                .map_err(|e| HttpError::request(endpoint, e))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::request(endpoint, e))?;

            if !status.is_success() {
                return Err(HttpError::status_code(
                    endpoint,
                    status,
                    truncate_text(&body, 200),
                ));
            }
            debug!("← {} {}", endpoint, status);
            Ok(body)
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(HttpError::Cancelled {
                endpoint: endpoint.to_string(),
            }),
            result = tokio::time::timeout(self.timeout, call) => match result {
                Ok(inner) => inner,
                Err(_) => Err(HttpError::Timeout {
                    endpoint: endpoint.to_string(),
                    timeout: self.timeout,
                }),
            },
        }
    }

    /// 可被取消的等待
    async fn sleep(&self, endpoint: &str, wait: Duration) -> Result<(), HttpError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(HttpError::Cancelled {
                endpoint: endpoint.to_string(),
            }),
            _ = tokio::time::sleep(wait) => Ok(()),
        }
    }

    /// 第 n 次重试的等待时间：base * 2^(n-1)
    fn backoff_for(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(10) as u32;
        self.retry_backoff.saturating_mul(1u32 << exponent)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, HttpError> {
    serde_json::from_str(body).map_err(|e| HttpError::decode(endpoint, e))
}
