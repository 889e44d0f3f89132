use super::comparator::ComparatorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error(transparent)]
    Comparator(#[from] ComparatorError),
    #[error("Duplicate submission id: {0}")]
    DuplicateSubmission(String),
}
