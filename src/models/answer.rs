use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::quiz::{QuestionSet, QuizChoice};

/// 单道题的作答记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    /// 选中的选项标记，未作答为 None
    pub selected_option: Option<String>,
    /// 原选项 + `"Difficulty: X"` 伪选项
    pub options: Vec<String>,
}

/// 整套题的作答记录：题干 → 作答
///
/// 条目顺序与 QuestionSet 一致，序列化为 JSON 对象时也保持这个顺序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    choice: QuizChoice,
    entries: Vec<(String, AnswerEntry)>,
}

impl AnswerRecord {
    /// 按位置对齐已确认的答案和题目列表
    ///
    /// 第 i 个答案只属于第 i 道题；答案数量由作答状态机保证等于题目数量。
    pub fn assemble(choice: QuizChoice, questions: &QuestionSet, committed: &[Option<String>]) -> Self {
        debug_assert_eq!(questions.len(), committed.len());

        let entries = questions
            .iter()
            .enumerate()
            .map(|(i, question)| {
                let mut options = question.options.clone();
                options.push(question.difficulty_option());
                (
                    question.question_text.clone(),
                    AnswerEntry {
                        selected_option: committed.get(i).cloned().flatten(),
                        options,
                    },
                )
            })
            .collect();

        Self { choice, entries }
    }

    pub fn choice(&self) -> QuizChoice {
        self.choice
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, AnswerEntry)] {
        &self.entries
    }

    pub fn get(&self, question_text: &str) -> Option<&AnswerEntry> {
        self.entries
            .iter()
            .find(|(text, _)| text == question_text)
            .map(|(_, entry)| entry)
    }

    /// 未作答的题数
    pub fn unanswered(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.selected_option.is_none())
            .count()
    }

    /// 提交给答案接收接口的载荷：`{ "MCQ": { <题干>: {...} } }`
    pub fn payload(&self) -> AnswerPayload<'_> {
        AnswerPayload { record: self }
    }
}

impl Serialize for AnswerRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (question_text, entry) in &self.entries {
            map.serialize_entry(question_text, entry)?;
        }
        map.end()
    }
}

/// 带题型外层键的提交载荷
#[derive(Debug, Clone, Copy)]
pub struct AnswerPayload<'a> {
    record: &'a AnswerRecord,
}

impl Serialize for AnswerPayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.record.choice.payload_key(), self.record)?;
        map.end()
    }
}

/// 评分服务回显的已存储答案
///
/// 评分时使用的是这份回显，而不是本地的 AnswerRecord。提交落盘和回显读取之间
/// 存在竞争：回显可能是旧的，这里只负责比对并报告，不做修正。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredAnswers(pub Value);

/// 回显与本地答案的比对结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchoConsistency {
    Matches,
    /// 列出不一致的题干
    Diverges { questions: Vec<String> },
    /// 回显的结构无法识别，无法比对
    Unverifiable,
}

impl StoredAnswers {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// 与本地答案比对
    pub fn consistency_with(&self, local: &AnswerRecord) -> EchoConsistency {
        let Some(echoed) = self
            .0
            .get(local.choice.payload_key())
            .or(Some(&self.0))
            .and_then(Value::as_object)
        else {
            return EchoConsistency::Unverifiable;
        };

        let mut diverging = Vec::new();
        for (question_text, entry) in &local.entries {
            let remote = echoed
                .get(question_text)
                .and_then(|v| v.get("selected_option"))
                .map(|v| v.as_str().map(str::to_string));
            match remote {
                Some(selected) if selected == entry.selected_option => {}
                _ => diverging.push(question_text.clone()),
            }
        }

        if diverging.is_empty() {
            EchoConsistency::Matches
        } else {
            EchoConsistency::Diverges {
                questions: diverging,
            }
        }
    }
}
