//! 反馈渲染 - 业务能力层
//!
//! 把评分结果转换为逐题对错 + 解析 + 总分。纯函数，没有网络和可变状态。

use std::fmt;

use serde::Serialize;

use crate::models::quiz::leading_ordinal;
use crate::models::GradedResult;

/// 评分结果中不是题目的伪键
const PSEUDO_KEYS: [&str; 2] = ["Correct", "Grade"];

/// 单题反馈
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackItem {
    /// 题干（含序号）
    pub question_label: String,
    /// 从题干开头解析出的序号
    pub ordinal: Option<usize>,
    pub is_correct: bool,
    pub explanation: String,
}

/// 整套题的反馈
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackReport {
    /// 按序号升序；没有序号的题目排在最后
    pub items: Vec<FeedbackItem>,
    pub overall_grade_percent: f64,
}

impl FeedbackReport {
    pub fn correct_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_correct).count()
    }
}

/// 渲染评分结果
///
/// 第 n 题是否正确取 `Correct[n-1] == 1`；题干没有序号或序号越界时视为错误。
pub fn render(graded: &GradedResult) -> FeedbackReport {
    let mut items: Vec<FeedbackItem> = graded
        .explanations
        .iter()
        .filter(|(key, _)| !PSEUDO_KEYS.contains(&key.as_str()))
        .map(|(key, explanation)| {
            let ordinal = leading_ordinal(key);
            FeedbackItem {
                question_label: key.clone(),
                ordinal,
                is_correct: ordinal.is_some_and(|n| graded.is_correct(n)),
                explanation: explanation.clone(),
            }
        })
        .collect();

    items.sort_by(|a, b| {
        (a.ordinal.is_none(), a.ordinal, &a.question_label)
            .cmp(&(b.ordinal.is_none(), b.ordinal, &b.question_label))
    });

    FeedbackReport {
        items,
        overall_grade_percent: graded.grade,
    }
}

impl fmt::Display for FeedbackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            let mark = if item.is_correct { "✅" } else { "❌" };
            writeln!(f, "{} {}", mark, item.question_label)?;
            writeln!(f, "   {}", item.explanation)?;
        }
        write!(f, "总分: {}%", self.overall_grade_percent)
    }
}
