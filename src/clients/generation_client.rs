/// 出题客户端
///
/// 每次调用只发一次请求，不自动重试
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::clients::GenerationApi;
use crate::config::{join_url, Config};
use crate::error::GenerationError;
use crate::infrastructure::HttpExecutor;
use crate::models::{QuestionSet, QuizChoice};

pub struct GenerationClient {
    executor: HttpExecutor,
    url: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
    choice: &'static str,
}

impl GenerationClient {
    pub fn new(config: &Config, executor: HttpExecutor) -> Self {
        Self {
            executor,
            url: join_url(&config.question_gen_base_url, &config.generate_questions_path),
        }
    }
}

#[async_trait]
impl GenerationApi for GenerationClient {
    async fn generate_questions(
        &self,
        text: &str,
        choice: QuizChoice,
    ) -> Result<QuestionSet, GenerationError> {
        info!("🧠 正在生成题目 (题型: {}, 文本 {} 字符)...", choice, text.chars().count());

        let payload = GenerateRequest {
            text,
            choice: choice.wire_value(),
        };
        let body: Value = self.executor.post_json(&self.url, &payload).await?;
        let questions = QuestionSet::from_response(body)?;

        info!("✓ 生成 {} 道题目", questions.len());
        Ok(questions)
    }
}
