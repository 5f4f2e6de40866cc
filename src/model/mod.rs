pub mod defaults;
pub mod question;
pub mod report;
pub mod response;

pub use question::{Question, QuestionDraft, QuestionFields, QuestionKind};
pub use report::{Report, ReportDraft, ReportFields, ReportReason};
pub use response::{Answer, Answers, Response};
