use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::GradingError;

const CORRECT_KEY: &str = "Correct";
const GRADE_KEY: &str = "Grade";

/// 评分服务返回的结果
///
/// 原始形态：`{ <题干>: 解析, "Correct": [1, 0, ...], "Grade": 80.0 }`，
/// 也可能整体包在 `"MCQ"` 键下。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedResult {
    /// 题干 → 解析文本
    pub explanations: Vec<(String, String)>,
    /// 按序号对齐的对错标记（1 为正确）
    pub correct: Vec<u8>,
    /// 总分（0–100）
    pub grade: f64,
}

impl GradedResult {
    pub fn from_response(value: Value) -> Result<Self, GradingError> {
        let object = match value {
            Value::Object(mut map) => match map.remove("MCQ") {
                Some(Value::Object(inner)) if !map.contains_key(GRADE_KEY) => inner,
                Some(other) => {
                    map.insert("MCQ".to_string(), other);
                    map
                }
                None => map,
            },
            other => {
                return Err(GradingError::MalformedResult(format!(
                    "期望 JSON 对象，实际为: {}",
                    other
                )))
            }
        };
        Self::from_map(object)
    }

    fn from_map(mut map: Map<String, Value>) -> Result<Self, GradingError> {
        let correct = match map.remove(CORRECT_KEY) {
            Some(Value::Array(flags)) => flags
                .iter()
                .map(correct_flag)
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(GradingError::MalformedResult(format!(
                    "Correct 不是数组: {}",
                    other
                )))
            }
            None => return Err(GradingError::MalformedResult("缺少 Correct".to_string())),
        };

        let grade = match map.remove(GRADE_KEY) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().ok(),
            _ => None,
        }
        .ok_or_else(|| GradingError::MalformedResult("缺少或无法解析 Grade".to_string()))?;

        let explanations = map
            .into_iter()
            .map(|(question, explanation)| {
                let text = match explanation {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (question, text)
            })
            .collect();

        Ok(Self {
            explanations,
            correct,
            grade,
        })
    }

    /// 第 ordinal 题（从 1 开始）是否正确
    pub fn is_correct(&self, ordinal: usize) -> bool {
        ordinal
            .checked_sub(1)
            .and_then(|i| self.correct.get(i))
            .is_some_and(|flag| *flag == 1)
    }
}

fn correct_flag(value: &Value) -> Result<u8, GradingError> {
    match value {
        Value::Bool(b) => Ok(u8::from(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Ok(1),
            Some(f) if f == 0.0 => Ok(0),
            _ => Err(GradingError::MalformedResult(format!("无效的对错标记: {}", n))),
        },
        other => Err(GradingError::MalformedResult(format!(
            "无效的对错标记: {}",
            other
        ))),
    }
}
