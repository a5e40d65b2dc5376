use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::QuizChoice;

/// 程序配置
///
/// 所有服务地址和路径都是配置项，不写死任何一个部署实例。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 服务地址 ---
    /// 出题服务（同时提供文本提取接口）
    pub question_gen_base_url: String,
    /// 评分服务
    pub grading_base_url: String,
    /// 中间层服务（接收上传的文档和答案）
    pub intermediary_base_url: String,

    // --- 接口路径 ---
    pub extract_text_path: String,
    pub generate_questions_path: String,
    pub upload_document_path: String,
    pub upload_answers_path: String,
    pub user_answers_path: String,
    pub explanations_path: String,
    pub empty_bucket_path: String,

    // --- 存储清理 ---
    pub bucket_name: String,
    pub folder_name: String,

    // --- 会话 ---
    /// 题型
    pub quiz_choice: QuizChoice,
    /// 本地文档路径，为空时认为文档已在服务端
    pub document_path: Option<String>,
    /// 答案提交失败后最多尝试的次数（含第一次）
    pub max_submission_attempts: usize,
    /// 预设答案（逗号分隔，如 `"a,b,,c"`），设置后不再从终端读取
    pub scripted_answers: Option<String>,

    // --- 网络 ---
    /// 单个请求的超时时间（秒）
    pub request_timeout_secs: u64,
    /// GET 请求最多重试次数（不含第一次）
    pub get_max_retries: usize,
    /// 重试基础退避时间（毫秒），每次翻倍
    pub retry_backoff_ms: u64,

    // --- 日志 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 会话日志文件
    pub output_log_file: String,
    /// 非致命警告写入的文件
    pub warn_file_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_gen_base_url: "http://localhost:8081".to_string(),
            grading_base_url: "http://localhost:8082".to_string(),
            intermediary_base_url: "http://localhost:8080".to_string(),
            extract_text_path: "/extract-text".to_string(),
            generate_questions_path: "/generate-questions".to_string(),
            upload_document_path: "/upload/".to_string(),
            upload_answers_path: "/upload_answers/".to_string(),
            user_answers_path: "/get-user-answers".to_string(),
            explanations_path: "/generate-explanations".to_string(),
            empty_bucket_path: "/empty-bucket".to_string(),
            bucket_name: "bitesize-documents-2".to_string(),
            folder_name: "documents_to_be_summarized".to_string(),
            quiz_choice: QuizChoice::MultipleChoice,
            document_path: None,
            max_submission_attempts: 3,
            scripted_answers: None,
            request_timeout_secs: 120,
            get_max_retries: 3,
            retry_backoff_ms: 500,
            verbose_logging: false,
            output_log_file: "session_log.txt".to_string(),
            warn_file_path: "warn.txt".to_string(),
        }
    }
}

impl Config {
    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 读取 TOML 配置文件，缺省字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// 完整加载流程：`QUIZ_CONFIG_FILE` 指定的文件（可选）→ 环境变量覆盖 → 校验
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var("QUIZ_CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(path)?.with_env_overrides(),
            _ => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 用环境变量覆盖当前值，解析失败的变量保持原值
    pub fn with_env_overrides(self) -> Self {
        Self {
            question_gen_base_url: env_or("QUESTION_GEN_BASE_URL", self.question_gen_base_url),
            grading_base_url: env_or("GRADING_BASE_URL", self.grading_base_url),
            intermediary_base_url: env_or("INTERMEDIARY_BASE_URL", self.intermediary_base_url),
            extract_text_path: env_or("EXTRACT_TEXT_PATH", self.extract_text_path),
            generate_questions_path: env_or("GENERATE_QUESTIONS_PATH", self.generate_questions_path),
            upload_document_path: env_or("UPLOAD_DOCUMENT_PATH", self.upload_document_path),
            upload_answers_path: env_or("UPLOAD_ANSWERS_PATH", self.upload_answers_path),
            user_answers_path: env_or("USER_ANSWERS_PATH", self.user_answers_path),
            explanations_path: env_or("EXPLANATIONS_PATH", self.explanations_path),
            empty_bucket_path: env_or("EMPTY_BUCKET_PATH", self.empty_bucket_path),
            bucket_name: env_or("BUCKET_NAME", self.bucket_name),
            folder_name: env_or("FOLDER_NAME", self.folder_name),
            quiz_choice: env_parse_or("QUIZ_CHOICE", self.quiz_choice),
            document_path: std::env::var("DOCUMENT_PATH").ok().or(self.document_path),
            max_submission_attempts: env_parse_or("MAX_SUBMISSION_ATTEMPTS", self.max_submission_attempts),
            scripted_answers: std::env::var("SCRIPTED_ANSWERS").ok().or(self.scripted_answers),
            request_timeout_secs: env_parse_or("REQUEST_TIMEOUT_SECS", self.request_timeout_secs),
            get_max_retries: env_parse_or("GET_MAX_RETRIES", self.get_max_retries),
            retry_backoff_ms: env_parse_or("RETRY_BACKOFF_MS", self.retry_backoff_ms),
            verbose_logging: env_parse_or("VERBOSE_LOGGING", self.verbose_logging),
            output_log_file: env_or("OUTPUT_LOG_FILE", self.output_log_file),
            warn_file_path: env_or("WARN_FILE_PATH", self.warn_file_path),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("question_gen_base_url", &self.question_gen_base_url),
            ("grading_base_url", &self.grading_base_url),
            ("intermediary_base_url", &self.intermediary_base_url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: name.to_string(),
                    reason: "服务地址不能为空".to_string(),
                });
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs".to_string(),
                reason: "超时时间必须大于 0".to_string(),
            });
        }
        if self.max_submission_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_submission_attempts".to_string(),
                reason: "至少需要尝试一次提交".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// 拼接服务地址和接口路径，处理两侧多余的斜杠
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn env_or(name: &str, current: String) -> String {
    std::env::var(name).unwrap_or(current)
}

fn env_parse_or<T: std::str::FromStr>(name: &str, current: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_trims_slashes() {
        assert_eq!(
            join_url("http://localhost:8080/", "/upload_answers/"),
            "http://localhost:8080/upload_answers/"
        );
        assert_eq!(
            join_url("http://a", "extract-text"),
            "http://a/extract-text"
        );
    }

    #[test]
    fn test_toml_partial_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            grading_base_url = "https://grading.example"
            quiz_choice = "multiple_choice"
            request_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.grading_base_url, "https://grading.example");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.extract_text_path, "/extract-text");
        assert_eq!(config.bucket_name, "bitesize-documents-2");
        assert!(config.document_path.is_none());
    }

    #[test]
    fn test_env_overrides_defaults() {
        std::env::set_var("EMPTY_BUCKET_PATH", "/cleanup");
        let config = Config::from_env();
        std::env::remove_var("EMPTY_BUCKET_PATH");

        assert_eq!(config.empty_bucket_path, "/cleanup");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref field, .. }) if field == "request_timeout_secs"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let config = Config {
            grading_base_url: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }
}
