use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::QuizChoice;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 会话流程错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// HTTP 客户端无法创建
    #[error("HTTP 客户端初始化失败: {0}")]
    Http(#[from] HttpError),
    /// 本地文件错误
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 单次 HTTP 交互的错误
///
/// 各阶段的错误类型都包装它，并补充自己所处的阶段。
#[derive(Debug, Error)]
pub enum HttpError {
    /// 网络请求失败（连接、发送、读取正文）
    #[error("请求 {endpoint} 失败: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 非 2xx 状态码
    #[error("{endpoint} 返回状态码 {status}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    /// 正文无法解析
    #[error("无法解析 {endpoint} 的响应: {reason}")]
    Decode { endpoint: String, reason: String },
    /// 超时
    #[error("请求 {endpoint} 超时 ({timeout:?})")]
    Timeout { endpoint: String, timeout: Duration },
    /// 被取消（用户离开会话）
    #[error("请求 {endpoint} 已取消")]
    Cancelled { endpoint: String },
}

impl HttpError {
    /// 返回 HTTP 状态码（如果有）
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 是否值得重试（只用于幂等的 GET）
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Request { .. } | HttpError::Timeout { .. } => true,
            HttpError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            HttpError::Decode { .. } | HttpError::Cancelled { .. } => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, HttpError::Cancelled { .. })
    }
}

/// 文本提取错误
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("文本提取失败: {0}")]
    Http(#[from] HttpError),
    /// 正文结构不对（例如缺少 document_text）
    #[error("提取服务返回的正文格式错误: {0}")]
    Malformed(String),
    /// 服务端没有任何可用文本（通常是文档还没上传）
    #[error("提取服务没有返回任何文本")]
    Empty,
}

impl ExtractionError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ExtractionError::Http(e) => e.status(),
            ExtractionError::Malformed(_) | ExtractionError::Empty => None,
        }
    }
}

/// 出题错误
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("出题请求失败: {0}")]
    Http(#[from] HttpError),
    #[error("出题服务返回了空题目列表")]
    EmptyQuestionSet,
    #[error("题目重复: {question_text}")]
    DuplicateQuestion { question_text: String },
    /// 题干序号与所在位置不一致
    #[error("第 {position} 题的题干序号为 {found}")]
    InconsistentOrdinal { position: usize, found: usize },
    #[error("出题服务返回的正文格式错误: {0}")]
    Malformed(String),
}

impl GenerationError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GenerationError::Http(e) => e.status(),
            _ => None,
        }
    }
}

/// 答案提交错误
#[derive(Debug, Error)]
#[error("答案提交失败: {0}")]
pub struct AnswerSubmissionError(#[from] pub HttpError);

/// 文档上传错误
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("无法读取文档 {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("文档上传失败: {0}")]
    Http(#[from] HttpError),
}

/// 评分流程的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingStep {
    FetchText,
    FetchUserAnswers,
    GenerateExplanations,
}

impl fmt::Display for GradingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingStep::FetchText => write!(f, "获取文档文本"),
            GradingStep::FetchUserAnswers => write!(f, "获取已存储的答案"),
            GradingStep::GenerateExplanations => write!(f, "生成解析与评分"),
        }
    }
}

/// 评分流程错误（前三步任一失败，整条流程终止）
#[derive(Debug, Error)]
pub enum GradingError {
    #[error("评分流程在「{}」步骤失败: {0}", GradingStep::FetchText)]
    FetchText(#[source] ExtractionError),
    #[error("评分流程在「{}」步骤失败: {0}", GradingStep::FetchUserAnswers)]
    FetchUserAnswers(#[source] HttpError),
    #[error("评分流程在「{}」步骤失败: {0}", GradingStep::GenerateExplanations)]
    GenerateExplanations(#[source] HttpError),
    #[error("评分结果格式错误: {0}")]
    MalformedResult(String),
}

impl GradingError {
    /// 失败的步骤
    pub fn step(&self) -> GradingStep {
        match self {
            GradingError::FetchText(_) => GradingStep::FetchText,
            GradingError::FetchUserAnswers(_) => GradingStep::FetchUserAnswers,
            GradingError::GenerateExplanations(_) | GradingError::MalformedResult(_) => {
                GradingStep::GenerateExplanations
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            GradingError::FetchText(ExtractionError::Http(e))
            | GradingError::FetchUserAnswers(e)
            | GradingError::GenerateExplanations(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// 清理存储失败，非致命
#[derive(Debug, Error)]
#[error("清理存储 {bucket_name}/{folder_name} 失败: {source}")]
pub struct CleanupWarning {
    pub bucket_name: String,
    pub folder_name: String,
    #[source]
    pub source: HttpError,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无法读取配置文件 {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML 解析失败 ({path}): {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("配置项 {field} 无效: {reason}")]
    Invalid { field: String, reason: String },
}

/// 会话流程错误
///
/// 每个变体对应一个致命阶段，驱动层需要把它展示给用户。
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("题型 {0} 暂未开放")]
    InactiveChoice(QuizChoice),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// 提交尝试次数用尽
    #[error("答案提交 {attempts} 次均失败: {last}")]
    SubmissionExhausted {
        attempts: usize,
        #[source]
        last: AnswerSubmissionError,
    },
    /// 用户选择放弃提交
    #[error("用户在第 {attempts} 次提交失败后放弃: {last}")]
    SubmissionAborted {
        attempts: usize,
        #[source]
        last: AnswerSubmissionError,
    },
    #[error(transparent)]
    Grading(#[from] GradingError),
    /// 答题输入失败（例如终端被关闭）
    #[error("读取作答失败: {0}")]
    AnswerInput(String),
    #[error("会话在「{stage}」阶段被取消")]
    Cancelled { stage: &'static str },
}

// ========== 便捷构造函数 ==========

impl HttpError {
    pub fn request(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        HttpError::Request {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn decode(endpoint: impl Into<String>, reason: impl fmt::Display) -> Self {
        HttpError::Decode {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn status_code(endpoint: impl Into<String>, status: StatusCode, body: impl Into<String>) -> Self {
        HttpError::Status {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
