//! 会话编排：用内存实现替换全部远程服务

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

use quiz_session::clients::{
    AnswerIngestionApi, DocumentUploadApi, ExtractionApi, GenerationApi, GradingApi,
};
use quiz_session::error::{
    AnswerSubmissionError, ExtractionError, GenerationError, GradingError, GradingStep, HttpError,
    SessionError, UploadError,
};
use quiz_session::models::answer::EchoConsistency;
use quiz_session::models::{
    AnswerRecord, ExtractedDocument, GradedResult, Question, QuestionSet, QuizChoice, StoredAnswers,
};
use quiz_session::orchestrator::SessionPorts;
use quiz_session::workflow::SubmissionDecision;
use quiz_session::{CancelToken, Config, QuizSession, ScriptedAnswers};

/// 所有远程服务的内存实现，按调用顺序记录
#[derive(Default)]
struct FakeServices {
    calls: Mutex<Vec<&'static str>>,
    extraction_status: Option<StatusCode>,
    submission_failures: Mutex<usize>,
    cleanup_fails: bool,
    /// 第二次提取（评分阶段取原文）返回 503
    fail_second_extraction: bool,
    fail_user_answers: bool,
    fail_explanations: bool,
    /// 不为空时回显这份旧答案，而不是最近一次提交的内容
    stale_echo: Option<Value>,
    submitted: Mutex<Option<Value>>,
}

impl FakeServices {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn ports(self: &Arc<Self>) -> SessionPorts {
        SessionPorts {
            upload: self.clone(),
            extraction: self.clone(),
            generation: self.clone(),
            ingestion: self.clone(),
            grading: self.clone(),
        }
    }
}

fn http_status(endpoint: &str, status: StatusCode) -> HttpError {
    HttpError::status_code(endpoint, status, "")
}

#[async_trait]
impl DocumentUploadApi for FakeServices {
    async fn upload_document(&self, _path: &Path) -> Result<(), UploadError> {
        self.log("upload");
        Ok(())
    }
}

#[async_trait]
impl ExtractionApi for FakeServices {
    async fn fetch_extracted_text(&self) -> Result<ExtractedDocument, ExtractionError> {
        let previous = self.calls().iter().filter(|c| **c == "extract").count();
        self.log("extract");
        if self.fail_second_extraction && previous == 1 {
            return Err(http_status("/extract-text", StatusCode::SERVICE_UNAVAILABLE).into());
        }
        match self.extraction_status {
            Some(status) => Err(http_status("/extract-text", status).into()),
            None => Ok(ExtractedDocument::new(vec![
                "Once upon a midnight dreary".to_string(),
                "Nevermore".to_string(),
            ])),
        }
    }
}

#[async_trait]
impl GenerationApi for FakeServices {
    async fn generate_questions(
        &self,
        text: &str,
        choice: QuizChoice,
    ) -> Result<QuestionSet, GenerationError> {
        self.log("generate");
        assert_eq!(text, "Once upon a midnight dreary\nNevermore");
        assert_eq!(choice, QuizChoice::MultipleChoice);
        QuestionSet::new(vec![
            Question {
                question_text: "1. 乌鸦停在哪里？".to_string(),
                options: vec!["a) 半身像".to_string(), "b) 窗台".to_string()],
                difficulty: "Easy".to_string(),
            },
            Question {
                question_text: "2. 诗的整体基调是？".to_string(),
                options: vec!["a) 欢快".to_string(), "b) 忧郁".to_string()],
                difficulty: "Medium".to_string(),
            },
        ])
    }
}

#[async_trait]
impl AnswerIngestionApi for FakeServices {
    async fn submit_answers(&self, record: &AnswerRecord) -> Result<(), AnswerSubmissionError> {
        self.log("submit");
        let mut failures = self.submission_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(AnswerSubmissionError(http_status(
                "/upload_answers/",
                StatusCode::SERVICE_UNAVAILABLE,
            )));
        }
        *self.submitted.lock().unwrap() = Some(serde_json::to_value(record.payload()).unwrap());
        Ok(())
    }
}

#[async_trait]
impl GradingApi for FakeServices {
    async fn fetch_user_answers(&self) -> Result<StoredAnswers, HttpError> {
        self.log("fetch_user_answers");
        if self.fail_user_answers {
            return Err(http_status("/get-user-answers", StatusCode::INTERNAL_SERVER_ERROR));
        }
        let echoed = match &self.stale_echo {
            Some(stale) => stale.clone(),
            None => self.submitted.lock().unwrap().clone().unwrap_or(Value::Null),
        };
        Ok(StoredAnswers(echoed))
    }

    async fn generate_explanations(
        &self,
        text: &str,
        user_answers: &StoredAnswers,
    ) -> Result<GradedResult, GradingError> {
        self.log("generate_explanations");
        if self.fail_explanations {
            return Err(GradingError::GenerateExplanations(http_status(
                "/generate-explanations",
                StatusCode::BAD_GATEWAY,
            )));
        }
        assert!(!text.is_empty());
        assert!(user_answers.as_value().is_object());
        GradedResult::from_response(json!({
            "2. 诗的整体基调是？": "全诗基调忧郁",
            "1. 乌鸦停在哪里？": "乌鸦停在帕拉斯半身像上",
            "Correct": [1, 0],
            "Grade": 50.0
        }))
    }

    async fn empty_bucket(&self, bucket_name: &str, folder_name: &str) -> Result<(), HttpError> {
        self.log("empty_bucket");
        assert_eq!(bucket_name, "bitesize-documents-2");
        assert_eq!(folder_name, "documents_to_be_summarized");
        if self.cleanup_fails {
            Err(http_status("/empty-bucket", StatusCode::INTERNAL_SERVER_ERROR))
        } else {
            Ok(())
        }
    }
}

fn config(test_name: &str) -> Config {
    Config {
        warn_file_path: std::env::temp_dir()
            .join(format!("quiz_warn_{}_{}.txt", test_name, std::process::id()))
            .to_string_lossy()
            .to_string(),
        ..Config::default()
    }
}

fn session(config: &Config, fakes: &Arc<FakeServices>) -> QuizSession {
    QuizSession::with_ports(config, fakes.ports(), CancelToken::new())
}

const FULL_RUN: [&str; 7] = [
    "extract",
    "generate",
    "submit",
    "extract",
    "fetch_user_answers",
    "generate_explanations",
    "empty_bucket",
];

#[tokio::test]
async fn test_two_question_session() {
    let fakes = Arc::new(FakeServices::default());
    let config = config("two_question");
    let mut answers = ScriptedAnswers::parse("a,b");

    let report = assert_ok!(session(&config, &fakes).run(&mut answers).await);

    let flags: Vec<bool> = report.feedback.items.iter().map(|i| i.is_correct).collect();
    assert_eq!(flags, vec![true, false]);
    assert_eq!(report.feedback.items[0].question_label, "1. 乌鸦停在哪里？");
    assert_eq!(report.feedback.overall_grade_percent, 50.0);
    assert_eq!(report.echo, EchoConsistency::Matches);
    assert!(report.cleanup_warning.is_none());
    assert_eq!(report.submission_attempts, 1);
    assert_eq!(report.session.total_questions(), 2);
    assert_eq!(fakes.calls(), FULL_RUN);
}

#[tokio::test]
async fn test_extraction_failure_aborts_before_generation() {
    let fakes = Arc::new(FakeServices {
        extraction_status: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..FakeServices::default()
    });
    let config = config("extraction_500");
    let mut answers = ScriptedAnswers::parse("a,b");

    let err = assert_err!(session(&config, &fakes).run(&mut answers).await);

    match err {
        SessionError::Extraction(e) => {
            assert_eq!(e.status(), Some(StatusCode::INTERNAL_SERVER_ERROR))
        }
        other => panic!("期望提取错误，实际: {other}"),
    }
    assert_eq!(fakes.calls(), vec!["extract"]);
}

#[tokio::test]
async fn test_aborted_submission_never_grades() {
    let fakes = Arc::new(FakeServices {
        submission_failures: Mutex::new(5),
        ..FakeServices::default()
    });
    let config = config("abort");
    let mut answers = ScriptedAnswers::parse("a,b").with_decisions([SubmissionDecision::Abort]);

    let err = assert_err!(session(&config, &fakes).run(&mut answers).await);

    assert!(matches!(err, SessionError::SubmissionAborted { attempts: 1, .. }));
    assert_eq!(fakes.calls(), vec!["extract", "generate", "submit"]);
}

#[tokio::test]
async fn test_exhausted_submission_never_grades() {
    let fakes = Arc::new(FakeServices {
        submission_failures: Mutex::new(5),
        ..FakeServices::default()
    });
    let config = Config {
        max_submission_attempts: 2,
        ..config("exhausted")
    };
    let mut answers = ScriptedAnswers::parse("a,b")
        .with_decisions([SubmissionDecision::Retry, SubmissionDecision::Retry]);

    let err = assert_err!(session(&config, &fakes).run(&mut answers).await);

    assert!(matches!(err, SessionError::SubmissionExhausted { attempts: 2, .. }));
    assert!(!fakes.calls().contains(&"generate_explanations"));
}

#[tokio::test]
async fn test_retry_after_failed_submission() {
    let fakes = Arc::new(FakeServices {
        submission_failures: Mutex::new(1),
        ..FakeServices::default()
    });
    let config = config("retry");
    let mut answers = ScriptedAnswers::parse("a,b").with_decisions([SubmissionDecision::Retry]);

    let report = assert_ok!(session(&config, &fakes).run(&mut answers).await);

    assert_eq!(report.submission_attempts, 2);
    let submits = fakes.calls().iter().filter(|c| **c == "submit").count();
    assert_eq!(submits, 2);
}

/// 评分步骤失败：返回 Grading 错误并带上失败步骤，之后的步骤和清理都不执行
async fn assert_grading_fails_at(
    fakes: FakeServices,
    test_name: &str,
    step: GradingStep,
) -> Vec<&'static str> {
    let fakes = Arc::new(fakes);
    let config = config(test_name);
    let mut answers = ScriptedAnswers::parse("a,b");

    let err = assert_err!(session(&config, &fakes).run(&mut answers).await);

    match err {
        SessionError::Grading(e) => assert_eq!(e.step(), step, "失败步骤不符: {e}"),
        other => panic!("期望评分错误，实际: {other}"),
    }
    let calls = fakes.calls();
    assert!(calls.contains(&"submit"), "评分失败前应已提交");
    assert!(!calls.contains(&"empty_bucket"), "评分失败时不应清理存储");
    calls
}

#[tokio::test]
async fn test_grading_fails_when_text_refetch_fails() {
    let calls = assert_grading_fails_at(
        FakeServices {
            fail_second_extraction: true,
            ..FakeServices::default()
        },
        "grading_fetch_text",
        GradingStep::FetchText,
    )
    .await;

    assert_eq!(calls, &FULL_RUN[..4]);
}

#[tokio::test]
async fn test_grading_fails_when_user_answers_unavailable() {
    let calls = assert_grading_fails_at(
        FakeServices {
            fail_user_answers: true,
            ..FakeServices::default()
        },
        "grading_user_answers",
        GradingStep::FetchUserAnswers,
    )
    .await;

    assert_eq!(calls, &FULL_RUN[..5]);
}

#[tokio::test]
async fn test_grading_fails_when_explanations_fail() {
    let calls = assert_grading_fails_at(
        FakeServices {
            fail_explanations: true,
            ..FakeServices::default()
        },
        "grading_explanations",
        GradingStep::GenerateExplanations,
    )
    .await;

    assert_eq!(calls, &FULL_RUN[..6]);
}

#[tokio::test]
async fn test_cleanup_failure_keeps_result() {
    let fakes = Arc::new(FakeServices {
        cleanup_fails: true,
        ..FakeServices::default()
    });
    let config = config("cleanup");
    let _ = std::fs::remove_file(&config.warn_file_path);
    let mut answers = ScriptedAnswers::parse("a,b");

    let report = assert_ok!(session(&config, &fakes).run(&mut answers).await);

    assert_eq!(report.feedback.overall_grade_percent, 50.0);
    assert_eq!(report.feedback.items.len(), 2);
    let warning = report.cleanup_warning.expect("应有清理警告");
    assert_eq!(warning.bucket_name, "bitesize-documents-2");

    let warn_file = std::fs::read_to_string(&config.warn_file_path).unwrap();
    assert!(warn_file.contains("存储清理失败"));
    let _ = std::fs::remove_file(&config.warn_file_path);
}

#[tokio::test]
async fn test_stale_echo_is_reported() {
    let fakes = Arc::new(FakeServices {
        stale_echo: Some(json!({
            "MCQ": {
                "1. 乌鸦停在哪里？": { "selected_option": "b", "options": [] },
                "2. 诗的整体基调是？": { "selected_option": "b", "options": [] }
            }
        })),
        ..FakeServices::default()
    });
    let config = config("stale_echo");
    let _ = std::fs::remove_file(&config.warn_file_path);
    let mut answers = ScriptedAnswers::parse("a,b");

    let report = assert_ok!(session(&config, &fakes).run(&mut answers).await);

    assert_eq!(
        report.echo,
        EchoConsistency::Diverges {
            questions: vec!["1. 乌鸦停在哪里？".to_string()]
        }
    );
    // 评分照常完成
    assert_eq!(fakes.calls(), FULL_RUN);
    let warn_file = std::fs::read_to_string(&config.warn_file_path).unwrap();
    assert!(warn_file.contains("答案回显不一致"));
    let _ = std::fs::remove_file(&config.warn_file_path);
}

#[tokio::test]
async fn test_inactive_choice_makes_no_calls() {
    let fakes = Arc::new(FakeServices::default());
    let config = Config {
        quiz_choice: QuizChoice::ShortAnswer,
        ..config("inactive")
    };
    let mut answers = ScriptedAnswers::parse("a,b");

    let err = assert_err!(session(&config, &fakes).run(&mut answers).await);

    assert!(matches!(err, SessionError::InactiveChoice(QuizChoice::ShortAnswer)));
    assert!(fakes.calls().is_empty());
}

#[tokio::test]
async fn test_configured_document_is_uploaded_first() {
    let fakes = Arc::new(FakeServices::default());
    let config = Config {
        document_path: Some("raven.pdf".to_string()),
        ..config("upload")
    };
    let mut answers = ScriptedAnswers::parse("a,b");

    assert_ok!(session(&config, &fakes).run(&mut answers).await);

    let calls = fakes.calls();
    assert_eq!(calls[0], "upload");
    assert_eq!(&calls[1..], FULL_RUN);
}

#[tokio::test]
async fn test_cancelled_session_stops_before_network() {
    let fakes = Arc::new(FakeServices::default());
    let config = config("cancelled");
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut answers = ScriptedAnswers::parse("a,b");

    let err = assert_err!(
        QuizSession::with_ports(&config, fakes.ports(), cancel)
            .run(&mut answers)
            .await
    );

    assert!(matches!(err, SessionError::Cancelled { .. }));
    assert!(fakes.calls().is_empty());
}
