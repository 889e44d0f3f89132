pub mod evaluation;

pub use evaluation::{EvaluationError, SubmissionEvaluator};
