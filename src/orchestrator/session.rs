//! 单次会话处理器 - 编排层
//!
//! ## 职责
//!
//! 把一次答题会话从头跑到尾，是会话级别的编排器。
//!
//! ## 核心流程
//!
//! 1. **题型检查**：未开放的题型在任何网络请求之前失败
//! 2. **上传文档**：配置了本地文档时才执行
//! 3. **提取文本**：失败则不会出题
//! 4. **出题**
//! 5. **作答 + 提交**：交给 `QuizFlow`
//! 6. **评分**：交给 `GradingPipeline`
//! 7. **警告落盘**：存储清理失败、答案回显不一致写入 warn 文件
//! 8. **渲染反馈**
//!
//! 每一步之间检查会话是否已被取消。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::{
    AnswerClient, AnswerIngestionApi, DocumentUploadApi, ExtractionApi, ExtractionClient,
    GenerationApi, GenerationClient, GradingApi, GradingClient, UploadClient,
};
use crate::config::Config;
use crate::error::{AppError, CleanupWarning, SessionError};
use crate::infrastructure::{CancelToken, HttpExecutor};
use crate::models::answer::EchoConsistency;
use crate::models::{QuizChoice, Session};
use crate::orchestrator::grading_pipeline::GradingPipeline;
use crate::services::feedback::{self, FeedbackReport};
use crate::services::WarnWriter;
use crate::utils::logging::truncate_text;
use crate::workflow::{AnswerSource, QuizFlow};

/// 会话依赖的全部远程服务
#[derive(Clone)]
pub struct SessionPorts {
    pub upload: Arc<dyn DocumentUploadApi>,
    pub extraction: Arc<dyn ExtractionApi>,
    pub generation: Arc<dyn GenerationApi>,
    pub ingestion: Arc<dyn AnswerIngestionApi>,
    pub grading: Arc<dyn GradingApi>,
}

impl SessionPorts {
    /// 用真实的 HTTP 客户端组装，所有客户端共用一个执行器
    pub fn http(config: &Config, executor: HttpExecutor) -> Self {
        Self {
            upload: Arc::new(UploadClient::new(config, executor.clone())),
            extraction: Arc::new(ExtractionClient::new(config, executor.clone())),
            generation: Arc::new(GenerationClient::new(config, executor.clone())),
            ingestion: Arc::new(AnswerClient::new(config, executor.clone())),
            grading: Arc::new(GradingClient::new(config, executor)),
        }
    }
}

/// 会话结束后交给驱动层展示的内容
#[derive(Debug)]
pub struct SessionReport {
    pub session: Session,
    pub feedback: FeedbackReport,
    pub echo: EchoConsistency,
    pub cleanup_warning: Option<CleanupWarning>,
    /// 成功前一共尝试了几次提交
    pub submission_attempts: usize,
}

/// 单次答题会话
pub struct QuizSession {
    ports: SessionPorts,
    choice: QuizChoice,
    document_path: Option<PathBuf>,
    max_submission_attempts: usize,
    bucket_name: String,
    folder_name: String,
    warn_writer: WarnWriter,
    cancel: CancelToken,
}

impl QuizSession {
    /// 根据配置创建，使用真实的 HTTP 客户端
    pub fn from_config(config: &Config, cancel: CancelToken) -> Result<Self, AppError> {
        let executor = HttpExecutor::new(config, cancel.clone())?;
        Ok(Self::with_ports(
            config,
            SessionPorts::http(config, executor),
            cancel,
        ))
    }

    /// 使用给定的服务实现创建（测试时注入内存实现）
    pub fn with_ports(config: &Config, ports: SessionPorts, cancel: CancelToken) -> Self {
        Self {
            ports,
            choice: config.quiz_choice,
            document_path: config
                .document_path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            max_submission_attempts: config.max_submission_attempts,
            bucket_name: config.bucket_name.clone(),
            folder_name: config.folder_name.clone(),
            warn_writer: WarnWriter::with_path(config.warn_file_path.clone()),
            cancel,
        }
    }

    pub fn choice(&self) -> QuizChoice {
        self.choice
    }

    /// 运行一次完整会话
    pub async fn run(&self, source: &mut dyn AnswerSource) -> Result<SessionReport, SessionError> {
        let mut session = Session::new(self.choice);
        info!("{} 🚀 会话开始", session);

        // ========== 1. 题型检查 ==========
        if !self.choice.is_active() {
            error!("{} ❌ 题型 {} 暂未开放", session, self.choice);
            return Err(SessionError::InactiveChoice(self.choice));
        }

        // ========== 2. 上传文档（可选） ==========
        if let Some(path) = &self.document_path {
            self.ensure_active("上传文档")?;
            if let Err(e) = self.ports.upload.upload_document(path).await {
                error!("{} ❌ 文档上传失败: {}", session, e);
                return Err(self.cancelled_or("上传文档", e.into()));
            }
        } else {
            info!("未配置本地文档，使用服务端已有的文档");
        }

        // ========== 3. 提取文本 ==========
        self.ensure_active("提取文本")?;
        let document = match self.ports.extraction.fetch_extracted_text().await {
            Ok(document) => document,
            Err(e) => {
                error!("{} ❌ 文本提取失败，不再出题: {}", session, e);
                return Err(self.cancelled_or("提取文本", e.into()));
            }
        };
        info!(
            "✓ 获取到 {} 行文本: {}",
            document.lines().len(),
            truncate_text(&document.joined(), 60)
        );
        let text = document.joined();
        session.document = Some(document);

        // ========== 4. 出题 ==========
        self.ensure_active("出题")?;
        let questions = match self.ports.generation.generate_questions(&text, self.choice).await {
            Ok(questions) => questions,
            Err(e) => {
                error!("{} ❌ 出题失败: {}", session, e);
                return Err(self.cancelled_or("出题", e.into()));
            }
        };
        session.questions = Some(questions.clone());

        // ========== 5. 作答 + 提交 ==========
        let flow = QuizFlow::new(&session.id, self.cancel.clone(), self.max_submission_attempts);
        let submitting = flow.traverse(self.choice, questions, source).await?;
        let done = flow
            .submit(submitting, self.ports.ingestion.as_ref(), source)
            .await?;

        // ========== 6. 评分 ==========
        self.ensure_active("评分")?;
        let pipeline = GradingPipeline::new(
            self.ports.extraction.clone(),
            self.ports.grading.clone(),
            self.bucket_name.clone(),
            self.folder_name.clone(),
        );
        let outcome = match pipeline.run(&done).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => return Err(SessionError::Cancelled { stage: "评分" }),
            Err(e) => {
                error!("{} ❌ {}", session, e);
                return Err(e.into());
            }
        };

        let submission_attempts = done.attempts();
        session.answers = Some(done.into_record());

        // ========== 7. 警告落盘 ==========
        self.record_warnings(&session.id, &outcome.echo, outcome.cleanup_warning.as_ref())
            .await;

        // ========== 8. 渲染反馈 ==========
        let feedback = feedback::render(&outcome.result);
        session.graded = Some(outcome.result);
        info!(
            "{} 🏁 会话完成: 答对 {}/{}, 总分 {}%",
            session,
            feedback.correct_count(),
            feedback.items.len(),
            feedback.overall_grade_percent
        );

        Ok(SessionReport {
            session,
            feedback,
            echo: outcome.echo,
            cleanup_warning: outcome.cleanup_warning,
            submission_attempts,
        })
    }

    fn ensure_active(&self, stage: &'static str) -> Result<(), SessionError> {
        if self.cancel.is_cancelled() {
            warn!("⚠️ 会话在「{}」之前被取消", stage);
            return Err(SessionError::Cancelled { stage });
        }
        Ok(())
    }

    /// 请求因取消而中断时，统一报告为取消
    fn cancelled_or(&self, stage: &'static str, err: SessionError) -> SessionError {
        if self.cancel.is_cancelled() {
            SessionError::Cancelled { stage }
        } else {
            err
        }
    }

    /// 非致命问题写入 warn 文件；写入失败只记日志
    async fn record_warnings(
        &self,
        session_id: &str,
        echo: &EchoConsistency,
        cleanup_warning: Option<&CleanupWarning>,
    ) {
        if let Some(warning) = cleanup_warning {
            if let Err(e) = self
                .warn_writer
                .write(session_id, "存储清理失败", &warning.to_string())
                .await
            {
                error!("写入 {} 失败: {}", self.warn_writer.path(), e);
            }
        }

        if let EchoConsistency::Diverges { questions } = echo {
            if let Err(e) = self
                .warn_writer
                .write(session_id, "答案回显不一致", &questions.join(" / "))
                .await
            {
                error!("写入 {} 失败: {}", self.warn_writer.path(), e);
            }
        }
    }
}
