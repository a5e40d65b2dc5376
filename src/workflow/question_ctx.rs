//! 作答上下文
//!
//! 封装"我正在作答哪次会话的第几题"这一信息

use std::fmt::Display;

/// 作答上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 会话 ID
    pub session_id: String,

    /// 题目序号（从 1 开始）
    pub ordinal: usize,

    /// 题目总数
    pub total: usize,
}

impl QuestionCtx {
    pub fn new(session_id: impl Into<String>, ordinal: usize, total: usize) -> Self {
        Self {
            session_id: session_id.into(),
            ordinal,
            total,
        }
    }

    pub fn is_last(&self) -> bool {
        self.ordinal == self.total
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 #{} 题目 {}/{}]",
            self.session_id, self.ordinal, self.total
        )
    }
}
