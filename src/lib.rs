//! # Quiz Session
//!
//! 文档答题会话：上传文档 → 远程出题 → 逐题作答 → 提交 → 远程评分 → 逐题反馈
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP 连接池），只暴露能力
//! - `HttpExecutor` - 唯一的 Client owner，负责超时、取消和 GET 重试
//! - `CancelToken` - 会话级取消信号
//!
//! ### ② 远程服务（Clients）
//! - `clients/` - 每个远程服务一个客户端，各自实现一个端口 trait
//! - 提取 / 出题 / 答案接收 / 评分 / 文档上传
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `feedback::render` - 评分结果 → 逐题反馈（纯函数）
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一套题"的作答流程
//! - `QuizTraversal` - 作答状态机（AwaitingAnswer → Submitting → Done）
//! - `QuizFlow` - 逐题作答 + 提交（重试 / 放弃）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/session` - 单次会话：上传 → 提取 → 出题 → 作答 → 评分 → 反馈
//! - `orchestrator/grading_pipeline` - 评分四步
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult, SessionError};
pub use infrastructure::{CancelToken, HttpExecutor};
pub use models::{AnswerRecord, GradedResult, Question, QuestionSet, QuizChoice};
pub use orchestrator::{GradingPipeline, QuizSession, SessionReport};
pub use services::feedback::{render, FeedbackReport};
pub use workflow::{AnswerSource, QuizFlow, QuizTraversal, ScriptedAnswers};
