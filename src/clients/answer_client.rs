/// 答案提交客户端
use async_trait::async_trait;
use tracing::info;

use crate::clients::AnswerIngestionApi;
use crate::config::{join_url, Config};
use crate::error::AnswerSubmissionError;
use crate::infrastructure::HttpExecutor;
use crate::models::AnswerRecord;

pub struct AnswerClient {
    executor: HttpExecutor,
    url: String,
}

impl AnswerClient {
    pub fn new(config: &Config, executor: HttpExecutor) -> Self {
        Self {
            executor,
            url: join_url(&config.intermediary_base_url, &config.upload_answers_path),
        }
    }
}

#[async_trait]
impl AnswerIngestionApi for AnswerClient {
    async fn submit_answers(&self, record: &AnswerRecord) -> Result<(), AnswerSubmissionError> {
        info!(
            "📤 正在提交 {} 道题的答案 (未作答 {} 道)...",
            record.len(),
            record.unanswered()
        );

        self.executor
            .post_json_ack(&self.url, &record.payload())
            .await?;

        info!("✓ 答案提交成功");
        Ok(())
    }
}
