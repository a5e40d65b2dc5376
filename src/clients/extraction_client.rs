/// 文本提取客户端
///
/// 服务端已经持有上传的文档，这里只负责取回提取出的文本
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::clients::ExtractionApi;
use crate::config::{join_url, Config};
use crate::error::ExtractionError;
use crate::infrastructure::HttpExecutor;
use crate::models::ExtractedDocument;

pub struct ExtractionClient {
    executor: HttpExecutor,
    url: String,
}

impl ExtractionClient {
    pub fn new(config: &Config, executor: HttpExecutor) -> Self {
        Self {
            executor,
            url: join_url(&config.question_gen_base_url, &config.extract_text_path),
        }
    }
}

#[async_trait]
impl ExtractionApi for ExtractionClient {
    async fn fetch_extracted_text(&self) -> Result<ExtractedDocument, ExtractionError> {
        info!("📄 正在获取文档文本...");

        let body: Value = self.executor.get_json(&self.url).await?;
        let document: ExtractedDocument = serde_json::from_value(body)
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        if document.is_empty() {
            return Err(ExtractionError::Empty);
        }

        debug!("文档共 {} 段", document.lines().len());
        info!("✓ 文档文本获取成功");
        Ok(document)
    }
}
