//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把各个远程服务按因果顺序串起来，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `session` - 单次会话处理器
//! - 题型检查、上传、提取、出题
//! - 委托 `QuizFlow` 作答和提交
//! - 委托 `GradingPipeline` 评分
//! - 非致命警告写入 warn 文件，最后渲染反馈
//!
//! ### `grading_pipeline` - 评分流程
//! - 重新获取文本 → 读取已存储答案 → 生成解析 → 清理存储
//! - 只接受提交成功后的 `Done` 状态
//!
//! ## 层次关系
//!
//! ```text
//! session (处理一次会话)
//!     ↓
//! workflow::QuizFlow (作答 + 提交)   grading_pipeline (评分)
//!     ↓                                  ↓
//! clients (端口：extraction / generation / ingestion / grading / upload)
//!     ↓
//! infrastructure (基础设施：HttpExecutor)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：session 管顺序，grading_pipeline 管评分四步
//! 2. **依赖注入**：远程服务都是 trait 对象，测试时可以替换
//! 3. **向下依赖**：编排层 → workflow → clients → infrastructure
//! 4. **清理不致命**：存储清理失败不会丢弃评分结果

pub mod grading_pipeline;
pub mod session;

// 重新导出主要类型
pub use grading_pipeline::{GradingOutcome, GradingPipeline};
pub use session::{QuizSession, SessionPorts, SessionReport};
