//! 作答状态机 - 流程层
//!
//! 状态：`AwaitingAnswer(i)`（i ∈ [0, N)）→ `Submitting` → `Done`
//!
//! 每个状态都是独立的类型，转移方法按值消费旧状态、返回新状态，
//! 非法转移在编译期就不存在。暂选和已确认答案放在同一个 `Selection` 值里随状态移动。

use std::sync::Arc;

use crate::models::{AnswerRecord, Question, QuestionSet, QuizChoice};

/// 可观察的状态标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    AwaitingAnswer(usize),
    Submitting,
    Done,
}

/// 任意时刻的作答状态（用于观察和日志）
#[derive(Debug, Clone)]
pub enum QuizTraversal {
    AwaitingAnswer(AwaitingAnswer),
    Submitting(Submitting),
    Done(Done),
}

impl QuizTraversal {
    /// 从第一题开始
    pub fn start(choice: QuizChoice, questions: QuestionSet) -> AwaitingAnswer {
        AwaitingAnswer::start(choice, questions)
    }

    pub fn state(&self) -> TraversalState {
        match self {
            QuizTraversal::AwaitingAnswer(s) => s.state(),
            QuizTraversal::Submitting(s) => s.state(),
            QuizTraversal::Done(s) => s.state(),
        }
    }
}

impl From<Advance> for QuizTraversal {
    fn from(advance: Advance) -> Self {
        match advance {
            Advance::Next(next) => QuizTraversal::AwaitingAnswer(next),
            Advance::Submit(submitting) => QuizTraversal::Submitting(submitting),
        }
    }
}

/// 当前题的暂选 + 之前各题已确认的答案
///
/// 不变量：`committed.len()` 等于当前题的下标。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub tentative: Option<String>,
    pub committed: Vec<Option<String>>,
}

/// 等待第 index 题作答
#[derive(Debug, Clone)]
pub struct AwaitingAnswer {
    choice: QuizChoice,
    questions: Arc<QuestionSet>,
    index: usize,
    selection: Selection,
}

/// 确认后的去向
#[derive(Debug, Clone)]
pub enum Advance {
    Next(AwaitingAnswer),
    Submit(Submitting),
}

/// 全部作答完成，等待提交
///
/// 提交失败时保留此状态，调用方可以重试或放弃。
#[derive(Debug, Clone)]
pub struct Submitting {
    record: AnswerRecord,
    failed_attempts: usize,
}

/// 提交成功，可以进入评分
///
/// 只能由 `Submitting::submitted` 产生，评分流程以它为输入，
/// 因此未提交的答案不可能被评分。
#[derive(Debug, Clone)]
pub struct Done {
    record: AnswerRecord,
    attempts: usize,
}

impl AwaitingAnswer {
    /// 初始状态 `AwaitingAnswer(0)`；QuestionSet 保证非空
    pub fn start(choice: QuizChoice, questions: QuestionSet) -> Self {
        Self {
            choice,
            questions: Arc::new(questions),
            index: 0,
            selection: Selection::default(),
        }
    }

    pub fn state(&self) -> TraversalState {
        TraversalState::AwaitingAnswer(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self) -> &Question {
        &self.questions[self.index]
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// 暂选一个选项，覆盖之前的暂选，不前进
    pub fn select_option(mut self, marker: impl Into<String>) -> Self {
        self.selection.tentative = Some(marker.into());
        self
    }

    /// 确认当前题（没有暂选则记为 None）并前进
    pub fn confirm_and_advance(mut self) -> Advance {
        let answer = self.selection.tentative.take();
        self.selection.committed.push(answer);

        if self.index + 1 < self.questions.len() {
            self.index += 1;
            Advance::Next(self)
        } else {
            let record = AnswerRecord::assemble(self.choice, &self.questions, &self.selection.committed);
            Advance::Submit(Submitting {
                record,
                failed_attempts: 0,
            })
        }
    }
}

impl Submitting {
    pub fn state(&self) -> TraversalState {
        TraversalState::Submitting
    }

    pub fn record(&self) -> &AnswerRecord {
        &self.record
    }

    pub fn failed_attempts(&self) -> usize {
        self.failed_attempts
    }

    /// 记录一次失败的提交，状态保持不变
    pub fn submission_failed(mut self) -> Self {
        self.failed_attempts += 1;
        self
    }

    /// 提交成功
    pub fn submitted(self) -> Done {
        Done {
            attempts: self.failed_attempts + 1,
            record: self.record,
        }
    }
}

impl Done {
    pub fn state(&self) -> TraversalState {
        TraversalState::Done
    }

    pub fn record(&self) -> &AnswerRecord {
        &self.record
    }

    /// 成功前一共尝试了几次提交
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn into_record(self) -> AnswerRecord {
        self.record
    }
}
