//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

/// 警告写入服务
///
/// 职责：
/// - 记录不影响结果、但需要人工跟进的问题（存储清理失败、答案回显不一致）
/// - 每条警告一行，附带会话 ID 和时间
/// - 不关心流程顺序
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用默认文件 warn.txt
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 写入警告信息
    ///
    /// # 参数
    /// - `session_id`: 会话 ID
    /// - `kind`: 警告类别
    /// - `message`: 详细信息
    pub async fn write(&self, session_id: &str, kind: &str, message: &str) -> Result<()> {
        debug!(
            "写入警告: 会话 {} | {} | 长度: {}",
            session_id,
            kind,
            message.len()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)?;

        let warn_msg = format!(
            "{} | 会话 {} | {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            session_id,
            kind,
            message.replace('\n', " ")
        );

        file.write_all(warn_msg.as_bytes())?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_appends_one_line_per_warning() {
        let path = std::env::temp_dir().join(format!("quiz_warn_{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let writer = WarnWriter::with_path(path.to_string_lossy());

        writer.write("s1", "存储清理失败", "bucket\nfolder").await.unwrap();
        writer.write("s1", "答案回显不一致", "1. q").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("会话 s1 | 存储清理失败 | bucket folder"));
        let _ = std::fs::remove_file(&path);
    }
}
