//! 作答流程 - 流程层
//!
//! 核心职责：把一套题从第一题走到提交成功
//!
//! 流程顺序：
//! 1. 逐题向 AnswerSource 要答案 → 暂选 → 确认
//! 2. 提交 AnswerRecord
//! 3. 提交失败 → 询问重试 / 放弃（有次数上限）

use tracing::{debug, error, info, warn};

use crate::clients::AnswerIngestionApi;
use crate::error::SessionError;
use crate::infrastructure::CancelToken;
use crate::models::{QuestionSet, QuizChoice};
use crate::workflow::answer_source::{AnswerSource, SubmissionDecision};
use crate::workflow::traversal::{Advance, AwaitingAnswer, Done, QuizTraversal, Submitting};
use crate::workflow::QuestionCtx;

/// 作答流程
///
/// - 驱动状态机，决定何时暂选、何时确认、何时提交
/// - 不持有网络资源，提交通过 AnswerIngestionApi 完成
/// - 每道题之间检查会话是否已被取消
pub struct QuizFlow {
    session_id: String,
    cancel: CancelToken,
    max_submission_attempts: usize,
}

impl QuizFlow {
    pub fn new(session_id: impl Into<String>, cancel: CancelToken, max_submission_attempts: usize) -> Self {
        Self {
            session_id: session_id.into(),
            cancel,
            max_submission_attempts: max_submission_attempts.max(1),
        }
    }

    /// 逐题作答，返回待提交的状态
    pub async fn traverse(
        &self,
        choice: QuizChoice,
        questions: QuestionSet,
        source: &mut dyn AnswerSource,
    ) -> Result<Submitting, SessionError> {
        let mut current = QuizTraversal::start(choice, questions);

        loop {
            if self.cancel.is_cancelled() {
                return Err(SessionError::Cancelled { stage: "作答" });
            }

            let ctx = QuestionCtx::new(&self.session_id, current.index() + 1, current.total());
            current = self.answer_one(current, &ctx, source).await?;

            match current.confirm_and_advance() {
                Advance::Next(next) => current = next,
                Advance::Submit(submitting) => {
                    info!(
                        "[会话 {}] ✓ 全部 {} 题作答完成（未作答 {} 题）",
                        self.session_id,
                        submitting.record().len(),
                        submitting.record().unanswered()
                    );
                    return Ok(submitting);
                }
            }
        }
    }

    /// 取得当前题的答案并暂选；不认识的标记跳过
    async fn answer_one(
        &self,
        mut state: AwaitingAnswer,
        ctx: &QuestionCtx,
        source: &mut dyn AnswerSource,
    ) -> Result<AwaitingAnswer, SessionError> {
        let picks = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SessionError::Cancelled { stage: "作答" }),
            picks = source.selections(ctx, state.question()) => picks?,
        };

        for pick in picks {
            let marker = state.question().canonical_marker(&pick).map(str::to_string);
            match marker {
                Some(marker) => {
                    debug!("{} 暂选 {}", ctx, marker);
                    state = state.select_option(marker);
                }
                None => warn!("{} ⚠️ 选项 {} 不存在，已忽略", ctx, pick),
            }
        }

        match state.selection().tentative.as_deref() {
            Some(marker) => info!("{} 📝 确认答案 {}", ctx, marker),
            None => info!("{} 📝 未作答", ctx),
        }
        Ok(state)
    }

    /// 提交答案，失败时按 AnswerSource 的决定重试或放弃
    pub async fn submit(
        &self,
        mut submitting: Submitting,
        ingestion: &dyn AnswerIngestionApi,
        source: &mut dyn AnswerSource,
    ) -> Result<Done, SessionError> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(SessionError::Cancelled { stage: "提交答案" });
            }

            let attempt = submitting.failed_attempts() + 1;
            info!(
                "[会话 {}] 📤 正在提交答案（第 {}/{} 次）...",
                self.session_id, attempt, self.max_submission_attempts
            );

            let err = match ingestion.submit_answers(submitting.record()).await {
                Ok(()) => return Ok(submitting.submitted()),
                Err(e) if e.0.is_cancelled() => {
                    return Err(SessionError::Cancelled { stage: "提交答案" });
                }
                Err(e) => e,
            };

            error!("[会话 {}] ❌ {}", self.session_id, err);
            submitting = submitting.submission_failed();

            if attempt >= self.max_submission_attempts {
                return Err(SessionError::SubmissionExhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let decision = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(SessionError::Cancelled { stage: "提交答案" });
                }
                decision = source.on_submission_failure(&err, attempt) => decision,
            };

            match decision {
                SubmissionDecision::Retry => {
                    info!("[会话 {}] 🔁 用户选择重试提交", self.session_id);
                }
                SubmissionDecision::Abort => {
                    warn!("[会话 {}] ⚠️ 用户放弃提交", self.session_id);
                    return Err(SessionError::SubmissionAborted {
                        attempts: attempt,
                        last: err,
                    });
                }
            }
        }
    }
}
