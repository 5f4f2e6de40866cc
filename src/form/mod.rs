//! Respondent form: control rendering, answer extraction and submission.

pub mod extract;
pub mod render;
pub mod submit;

pub use extract::FormData;
pub use submit::{SubmissionGuard, SubmitOutcome};
