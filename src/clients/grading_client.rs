/// 评分服务客户端
///
/// 封装评分服务的三个接口：读取已存储答案、生成解析、清空存储
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::clients::GradingApi;
use crate::config::{join_url, Config};
use crate::error::{GradingError, HttpError};
use crate::infrastructure::HttpExecutor;
use crate::models::{GradedResult, StoredAnswers};

pub struct GradingClient {
    executor: HttpExecutor,
    user_answers_url: String,
    explanations_url: String,
    empty_bucket_url: String,
}

#[derive(Debug, Serialize)]
struct ExplanationRequest<'a> {
    text: &'a str,
    user_answers: &'a StoredAnswers,
}

#[derive(Debug, Serialize)]
struct EmptyBucketRequest<'a> {
    bucket_name: &'a str,
    folder_name: &'a str,
}

impl GradingClient {
    pub fn new(config: &Config, executor: HttpExecutor) -> Self {
        Self {
            executor,
            user_answers_url: join_url(&config.grading_base_url, &config.user_answers_path),
            explanations_url: join_url(&config.grading_base_url, &config.explanations_path),
            empty_bucket_url: join_url(&config.grading_base_url, &config.empty_bucket_path),
        }
    }
}

#[async_trait]
impl GradingApi for GradingClient {
    async fn fetch_user_answers(&self) -> Result<StoredAnswers, HttpError> {
        debug!("读取已存储的答案: {}", self.user_answers_url);
        self.executor.get_json(&self.user_answers_url).await
    }

    async fn generate_explanations(
        &self,
        text: &str,
        user_answers: &StoredAnswers,
    ) -> Result<GradedResult, GradingError> {
        info!("📝 正在请求评分与解析...");

        let payload = ExplanationRequest { text, user_answers };
        let body: Value = self
            .executor
            .post_json(&self.explanations_url, &payload)
            .await
            .map_err(GradingError::GenerateExplanations)?;

        GradedResult::from_response(body)
    }

    async fn empty_bucket(&self, bucket_name: &str, folder_name: &str) -> Result<(), HttpError> {
        info!("🧹 正在清理存储 {}/{}...", bucket_name, folder_name);

        let payload = EmptyBucketRequest {
            bucket_name,
            folder_name,
        };
        self.executor
            .post_json_ack(&self.empty_bucket_url, &payload)
            .await
    }
}
