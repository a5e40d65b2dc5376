use chrono::{DateTime, Local};

use crate::models::{AnswerRecord, ExtractedDocument, GradedResult, QuestionSet, QuizChoice};

/// 一次会话的全部临时数据
///
/// 只存在于一次运行中，不做任何持久化。各字段随流程推进依次填充。
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Local>,
    pub choice: QuizChoice,
    pub document: Option<ExtractedDocument>,
    pub questions: Option<QuestionSet>,
    pub answers: Option<AnswerRecord>,
    pub graded: Option<GradedResult>,
}

impl Session {
    pub fn new(choice: QuizChoice) -> Self {
        let started_at = Local::now();
        Self {
            id: started_at.format("%Y%m%d-%H%M%S%3f").to_string(),
            started_at,
            choice,
            document: None,
            questions: None,
            answers: None,
            graded: None,
        }
    }

    pub fn total_questions(&self) -> usize {
        self.questions.as_ref().map_or(0, QuestionSet::len)
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 #{} 题型#{} 题数#{}]",
            self.id,
            self.choice,
            self.total_questions()
        )
    }
}
