use serde::{Deserialize, Serialize};

/// 提取服务返回的文档文本
///
/// 按行保存，发送前用换行符拼接成一整段。取回后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    #[serde(rename = "document_text")]
    lines: Vec<String>,
}

impl ExtractedDocument {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// 拼接后的完整文本
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }
}
