//! 远程服务客户端
//!
//! 每个远程协作方一个客户端，并各自实现一个端口 trait。流程层只依赖 trait，
//! 测试时可以换成内存实现（例如模拟过期的答案回显）。

use std::path::Path;

use async_trait::async_trait;

use crate::error::{
    AnswerSubmissionError, ExtractionError, GenerationError, GradingError, HttpError, UploadError,
};
use crate::models::{AnswerRecord, ExtractedDocument, GradedResult, QuestionSet, QuizChoice, StoredAnswers};

pub mod answer_client;
pub mod extraction_client;
pub mod generation_client;
pub mod grading_client;
pub mod upload_client;

pub use answer_client::AnswerClient;
pub use extraction_client::ExtractionClient;
pub use generation_client::GenerationClient;
pub use grading_client::GradingClient;
pub use upload_client::UploadClient;

/// 文档上传
#[async_trait]
pub trait DocumentUploadApi: Send + Sync {
    async fn upload_document(&self, path: &Path) -> Result<(), UploadError>;
}

/// 文本提取（出题和评分共用同一个实例）
#[async_trait]
pub trait ExtractionApi: Send + Sync {
    async fn fetch_extracted_text(&self) -> Result<ExtractedDocument, ExtractionError>;
}

/// 出题
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn generate_questions(
        &self,
        text: &str,
        choice: QuizChoice,
    ) -> Result<QuestionSet, GenerationError>;
}

/// 答案接收
#[async_trait]
pub trait AnswerIngestionApi: Send + Sync {
    async fn submit_answers(&self, record: &AnswerRecord) -> Result<(), AnswerSubmissionError>;
}

/// 评分服务
#[async_trait]
pub trait GradingApi: Send + Sync {
    /// 读取服务端已存储的答案（回显，而非本地副本）
    async fn fetch_user_answers(&self) -> Result<StoredAnswers, HttpError>;

    /// 生成解析并评分
    async fn generate_explanations(
        &self,
        text: &str,
        user_answers: &StoredAnswers,
    ) -> Result<GradedResult, GradingError>;

    /// 清空本次会话使用的存储目录
    async fn empty_bucket(&self, bucket_name: &str, folder_name: &str) -> Result<(), HttpError>;
}
