//! 评分流程 - 编排层
//!
//! ## 步骤
//!
//! 1. 重新获取文档文本（与出题共用同一个提取服务）
//! 2. 从评分服务读取已存储的答案，并与本地答案比对
//! 3. 生成解析与评分（只发一次）
//! 4. 清空存储目录，失败只记警告
//!
//! 前三步任一失败，整条流程终止并报告失败的步骤。
//! 输入是 `Done`，只有提交成功后才拿得到，所以评分不可能先于提交。

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::{ExtractionApi, GradingApi};
use crate::error::{CleanupWarning, GradingError};
use crate::models::answer::EchoConsistency;
use crate::models::GradedResult;
use crate::workflow::Done;

/// 评分流程的产出
#[derive(Debug)]
pub struct GradingOutcome {
    pub result: GradedResult,
    /// 评分所用回显与本地答案的比对结果
    pub echo: EchoConsistency,
    /// 存储清理失败时的警告，不影响 `result`
    pub cleanup_warning: Option<CleanupWarning>,
}

pub struct GradingPipeline {
    extraction: Arc<dyn ExtractionApi>,
    grading: Arc<dyn GradingApi>,
    bucket_name: String,
    folder_name: String,
}

impl GradingPipeline {
    pub fn new(
        extraction: Arc<dyn ExtractionApi>,
        grading: Arc<dyn GradingApi>,
        bucket_name: impl Into<String>,
        folder_name: impl Into<String>,
    ) -> Self {
        Self {
            extraction,
            grading,
            bucket_name: bucket_name.into(),
            folder_name: folder_name.into(),
        }
    }

    pub async fn run(&self, done: &Done) -> Result<GradingOutcome, GradingError> {
        // ========== 1. 文档文本 ==========
        info!("📄 评分: 重新获取文档文本...");
        let document = self
            .extraction
            .fetch_extracted_text()
            .await
            .map_err(GradingError::FetchText)?;
        let text = document.joined();

        // ========== 2. 已存储的答案 ==========
        info!("📥 评分: 读取服务端已存储的答案...");
        let stored = self
            .grading
            .fetch_user_answers()
            .await
            .map_err(GradingError::FetchUserAnswers)?;

        let echo = stored.consistency_with(done.record());
        match &echo {
            EchoConsistency::Matches => info!("✓ 服务端答案与本地一致"),
            EchoConsistency::Diverges { questions } => warn!(
                "⚠️ 服务端答案与本地不一致（{} 题），评分以服务端为准: {:?}",
                questions.len(),
                questions
            ),
            EchoConsistency::Unverifiable => warn!("⚠️ 服务端答案结构无法识别，跳过比对"),
        }

        // ========== 3. 解析与评分 ==========
        let result = self.grading.generate_explanations(&text, &stored).await?;
        info!(
            "✓ 评分完成: {} 条解析, 总分 {}%",
            result.explanations.len(),
            result.grade
        );

        // ========== 4. 清理存储（非致命） ==========
        let cleanup_warning = match self
            .grading
            .empty_bucket(&self.bucket_name, &self.folder_name)
            .await
        {
            Ok(()) => {
                info!("✓ 存储已清理");
                None
            }
            Err(source) => {
                let warning = CleanupWarning {
                    bucket_name: self.bucket_name.clone(),
                    folder_name: self.folder_name.clone(),
                    source,
                };
                warn!("⚠️ {}", warning);
                Some(warning)
            }
        };

        Ok(GradingOutcome {
            result,
            echo,
            cleanup_warning,
        })
    }
}
