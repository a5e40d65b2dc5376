use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizChoice {
    /// 单项选择题
    MultipleChoice,
    /// 简答题（暂未开放）
    ShortAnswer,
}

impl QuizChoice {
    /// 发送给出题服务的取值
    pub fn wire_value(&self) -> &'static str {
        match self {
            QuizChoice::MultipleChoice => "1",
            QuizChoice::ShortAnswer => "2",
        }
    }

    /// 提交答案时的外层键名
    pub fn payload_key(&self) -> &'static str {
        match self {
            QuizChoice::MultipleChoice => "MCQ",
            QuizChoice::ShortAnswer => "SA",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, QuizChoice::MultipleChoice)
    }
}

impl fmt::Display for QuizChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizChoice::MultipleChoice => write!(f, "单项选择"),
            QuizChoice::ShortAnswer => write!(f, "简答"),
        }
    }
}

impl FromStr for QuizChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "mcq" | "multiple_choice" => Ok(QuizChoice::MultipleChoice),
            "2" | "sa" | "short_answer" => Ok(QuizChoice::ShortAnswer),
            other => Err(format!("未知题型: {}", other)),
        }
    }
}

/// 单道题目
///
/// `question_text` 以序号开头（如 `"1. ..."`），选项以字母标记开头（如 `"a) ..."`）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_text: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub difficulty: String,
}

impl Question {
    /// 题干开头的序号（从 1 开始）
    pub fn ordinal(&self) -> Option<usize> {
        leading_ordinal(&self.question_text)
    }

    /// 去掉序号后的题干
    pub fn prompt(&self) -> &str {
        match self.question_text.split_once(". ") {
            Some((head, rest)) if head.trim().chars().all(|c| c.is_ascii_digit()) => rest,
            _ => &self.question_text,
        }
    }

    /// 每个选项的标记（`")"` 之前的部分）
    pub fn option_markers(&self) -> Vec<&str> {
        self.options
            .iter()
            .map(|option| match option.split_once(')') {
                Some((marker, _)) => marker.trim(),
                None => option.trim(),
            })
            .collect()
    }

    /// 第 i 个选项去掉标记后的内容
    pub fn option_label(&self, i: usize) -> Option<&str> {
        self.options.get(i).map(|option| match option.split_once(") ") {
            Some((_, label)) => label,
            None => option.as_str(),
        })
    }

    /// 把用户输入（大小写不敏感）对应到选项本身的标记
    pub fn canonical_marker(&self, input: &str) -> Option<&str> {
        self.option_markers()
            .into_iter()
            .find(|m| m.eq_ignore_ascii_case(input.trim()))
    }

    /// 提交给评分服务时附带的难度伪选项
    pub fn difficulty_option(&self) -> String {
        format!("Difficulty: {}", self.difficulty)
    }
}

/// 出题服务返回的题目列表，决定作答顺序
///
/// 保证：非空、题干不重复、题干序号（若有）等于位置 + 1。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

/// 出题服务的两种返回形态
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionSetWire {
    Bare(Vec<Question>),
    Wrapped {
        #[serde(rename = "MCQ")]
        mcq: Vec<Question>,
    },
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Result<Self, GenerationError> {
        if questions.is_empty() {
            return Err(GenerationError::EmptyQuestionSet);
        }

        let mut seen = HashSet::new();
        for (position, question) in questions.iter().enumerate() {
            if !seen.insert(question.question_text.as_str()) {
                return Err(GenerationError::DuplicateQuestion {
                    question_text: question.question_text.clone(),
                });
            }
            if let Some(found) = question.ordinal() {
                if found != position + 1 {
                    return Err(GenerationError::InconsistentOrdinal {
                        position: position + 1,
                        found,
                    });
                }
            }
        }

        Ok(Self { questions })
    }

    /// 解析出题服务的响应（裸数组或 `{"MCQ": [...]}`）
    pub fn from_response(value: serde_json::Value) -> Result<Self, GenerationError> {
        let wire: QuestionSetWire = serde_json::from_value(value)
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let questions = match wire {
            QuestionSetWire::Bare(questions) => questions,
            QuestionSetWire::Wrapped { mcq } => mcq,
        };
        Self::new(questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }
}

impl std::ops::Index<usize> for QuestionSet {
    type Output = Question;

    fn index(&self, index: usize) -> &Question {
        &self.questions[index]
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

/// 取文本开头的整数序号，如 `"10. xxx"` → 10
///
/// 数字后必须紧跟 `.`，`"1984 is set in..."` 这类以数字开头的题干没有序号。
pub fn leading_ordinal(text: &str) -> Option<usize> {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    let re = ORDINAL.get_or_init(|| Regex::new(r"^\s*(\d+)\.").expect("序号正则无效"));
    re.captures(text)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
