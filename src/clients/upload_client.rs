/// 文档上传客户端
///
/// 以 multipart 表单字段 `file` 上传本地文档
use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::clients::DocumentUploadApi;
use crate::config::{join_url, Config};
use crate::error::UploadError;
use crate::infrastructure::HttpExecutor;

pub struct UploadClient {
    executor: HttpExecutor,
    url: String,
}

impl UploadClient {
    pub fn new(config: &Config, executor: HttpExecutor) -> Self {
        Self {
            executor,
            url: join_url(&config.intermediary_base_url, &config.upload_document_path),
        }
    }
}

#[async_trait]
impl DocumentUploadApi for UploadClient {
    async fn upload_document(&self, path: &Path) -> Result<(), UploadError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| UploadError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        info!("📎 正在上传文档 {} ({} 字节)...", file_name, bytes.len());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        self.executor.post_multipart(&self.url, form).await?;

        info!("✓ 文档上传成功");
        Ok(())
    }
}
