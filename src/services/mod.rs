pub mod feedback;
pub mod warn_writer;

pub use feedback::{render, FeedbackItem, FeedbackReport};
pub use warn_writer::WarnWriter;
