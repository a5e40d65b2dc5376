pub mod answer;
pub mod document;
pub mod graded;
pub mod quiz;
pub mod session;

pub use answer::{AnswerEntry, AnswerRecord, StoredAnswers};
pub use document::ExtractedDocument;
pub use graded::GradedResult;
pub use quiz::{Question, QuestionSet, QuizChoice};
pub use session::Session;
