//! 终端驱动
//!
//! 负责应用生命周期：初始化日志文件 → 创建会话 → 运行 → 输出反馈。
//! 作答来源是终端输入，或者配置中的预设答案。

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AnswerSubmissionError, SessionError};
use crate::infrastructure::CancelToken;
use crate::models::answer::EchoConsistency;
use crate::models::Question;
use crate::orchestrator::{QuizSession, SessionReport};
use crate::utils::logging;
use crate::workflow::{AnswerSource, QuestionCtx, ScriptedAnswers, SubmissionDecision};

/// 应用主结构
pub struct App {
    config: Config,
    session: QuizSession,
    cancel: CancelToken,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        logging::log_startup(&config);

        let cancel = CancelToken::new();
        let session = QuizSession::from_config(&config, cancel.clone())?;

        Ok(Self {
            config,
            session,
            cancel,
        })
    }

    /// 运行一次会话
    pub async fn run(&self) -> Result<()> {
        self.watch_ctrl_c();
        info!("📝 题型: {}", self.session.choice());

        let mut source: Box<dyn AnswerSource> = match &self.config.scripted_answers {
            Some(list) => {
                info!("📋 使用预设答案: {}", list);
                Box::new(ScriptedAnswers::parse(list))
            }
            None => Box::new(ConsoleAnswers::new()),
        };

        let report = match self.session.run(source.as_mut()).await {
            Ok(report) => report,
            Err(e) => {
                error!("❌ 会话失败: {}", e);
                eprintln!("\n会话失败: {}", e);
                return Err(e.into());
            }
        };

        self.present(&report)?;
        Ok(())
    }

    /// Ctrl-C 时取消会话，正在进行的请求会被放弃
    fn watch_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⚠️ 收到 Ctrl-C，正在取消会话...");
                cancel.cancel();
            }
        });
    }

    /// 输出反馈并写入会话日志
    fn present(&self, report: &SessionReport) -> Result<()> {
        println!("\n{}", report.feedback);

        if let Some(warning) = &report.cleanup_warning {
            println!("注意: {}（评分结果不受影响）", warning);
        }
        if let EchoConsistency::Diverges { questions } = &report.echo {
            println!(
                "注意: 服务端记录的答案与本地有 {} 题不一致，评分以服务端为准",
                questions.len()
            );
        }

        logging::append_report(
            &self.config.output_log_file,
            &report.session.to_string(),
            &report.feedback,
        )?;
        logging::print_final_stats(&report.feedback, &self.config.output_log_file);
        Ok(())
    }
}

/// 从终端读取作答
///
/// 输入选项标记即暂选（可以多次修改），空行确认当前题。
pub struct ConsoleAnswers {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleAnswers {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn read_line(&mut self) -> Result<String, SessionError> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(SessionError::AnswerInput("输入已关闭".to_string())),
            Err(e) => Err(SessionError::AnswerInput(e.to_string())),
        }
    }
}

impl Default for ConsoleAnswers {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerSource for ConsoleAnswers {
    async fn selections(
        &mut self,
        ctx: &QuestionCtx,
        question: &Question,
    ) -> Result<Vec<String>, SessionError> {
        println!("\n第 {}/{} 题: {}", ctx.ordinal, ctx.total, question.prompt());
        for (i, marker) in question.option_markers().into_iter().enumerate() {
            println!("  [{}] {}", marker, question.option_label(i).unwrap_or(marker));
        }
        println!("输入选项标记暂选，回车确认{}", if ctx.is_last() { "并提交" } else { "" });

        let mut picks = Vec::new();
        loop {
            let line = self.read_line().await?;
            let input = line.trim();
            if input.is_empty() {
                return Ok(picks);
            }
            match question.canonical_marker(input) {
                Some(marker) => {
                    println!("已暂选 {}", marker);
                    picks.push(marker.to_string());
                }
                None => println!("没有选项 {}，可选: {}", input, question.option_markers().join(" / ")),
            }
        }
    }

    async fn on_submission_failure(
        &mut self,
        error: &AnswerSubmissionError,
        attempts: usize,
    ) -> SubmissionDecision {
        println!("\n第 {} 次提交失败: {}", attempts, error);
        loop {
            println!("输入 r 重试，q 放弃");
            match self.read_line().await {
                Ok(line) => match line.trim() {
                    "r" | "R" => return SubmissionDecision::Retry,
                    "q" | "Q" => return SubmissionDecision::Abort,
                    _ => continue,
                },
                Err(_) => return SubmissionDecision::Abort,
            }
        }
    }
}
