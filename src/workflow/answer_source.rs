//! 作答来源 - 流程层
//!
//! 状态机只认"暂选 / 确认"两个动作，谁来给出这些动作由 `AnswerSource` 决定：
//! 终端里是用户输入，测试和无人值守运行时是预先写好的答案。

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::error::{AnswerSubmissionError, SessionError};
use crate::models::Question;
use crate::workflow::QuestionCtx;

/// 提交失败后的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionDecision {
    Retry,
    Abort,
}

/// 作答来源
#[async_trait]
pub trait AnswerSource: Send {
    /// 当前题依次暂选的选项标记，最后一个在确认时生效；返回空表示不作答直接确认
    async fn selections(
        &mut self,
        ctx: &QuestionCtx,
        question: &Question,
    ) -> Result<Vec<String>, SessionError>;

    /// 第 `attempts` 次提交失败后决定重试还是放弃
    async fn on_submission_failure(
        &mut self,
        error: &AnswerSubmissionError,
        attempts: usize,
    ) -> SubmissionDecision;
}

/// 预先写好的答案
///
/// 答案用完后剩余题目不作答；重试决定用完后一律放弃。
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnswers {
    picks: VecDeque<Vec<String>>,
    decisions: VecDeque<SubmissionDecision>,
}

impl ScriptedAnswers {
    /// 每题一个答案，`None` 表示该题不作答
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            picks: answers
                .into_iter()
                .map(|answer| answer.map(Into::into).into_iter().collect())
                .collect(),
            decisions: VecDeque::new(),
        }
    }

    /// 解析逗号分隔的答案，如 `"a,b,,c"`（空项表示不作答）
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(',').map(|item| {
            let item = item.trim();
            (!item.is_empty()).then(|| item.to_string())
        }))
    }

    /// 同一题先后暂选多个选项
    pub fn with_picks(mut self, picks: Vec<Vec<String>>) -> Self {
        self.picks = picks.into();
        self
    }

    /// 提交失败时依次采用的决定
    pub fn with_decisions(mut self, decisions: impl IntoIterator<Item = SubmissionDecision>) -> Self {
        self.decisions = decisions.into_iter().collect();
        self
    }
}

#[async_trait]
impl AnswerSource for ScriptedAnswers {
    async fn selections(
        &mut self,
        _ctx: &QuestionCtx,
        _question: &Question,
    ) -> Result<Vec<String>, SessionError> {
        Ok(self.picks.pop_front().unwrap_or_default())
    }

    async fn on_submission_failure(
        &mut self,
        _error: &AnswerSubmissionError,
        _attempts: usize,
    ) -> SubmissionDecision {
        self.decisions.pop_front().unwrap_or(SubmissionDecision::Abort)
    }
}
