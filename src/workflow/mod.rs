pub mod answer_source;
pub mod question_ctx;
pub mod quiz_flow;
pub mod traversal;

pub use answer_source::{AnswerSource, ScriptedAnswers, SubmissionDecision};
pub use question_ctx::QuestionCtx;
pub use quiz_flow::QuizFlow;
pub use traversal::{Advance, AwaitingAnswer, Done, QuizTraversal, Selection, Submitting, TraversalState};
