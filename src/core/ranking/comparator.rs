//! 两两比较的外部裁判

use super::types::ComparisonResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComparatorError {
    #[error("Comparator unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid judgment: {0}")]
    InvalidJudgment(String),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// 一次比较请求；帧为 base64 编码的 JPEG
#[derive(Debug, Clone, Copy)]
pub struct ComparisonRequest<'a> {
    pub frames_a: &'a [String],
    pub frames_b: &'a [String],
    pub task_description: &'a str,
    pub criteria: &'a [String],
    pub name_a: &'a str,
    pub name_b: &'a str,
}

/// 裁判能力。实现方自行负责重试与降级，排名引擎只做同步调用。
pub trait Comparator {
    fn compare(&mut self, request: &ComparisonRequest<'_>) -> Result<ComparisonResult, ComparatorError>;
}

impl<F> Comparator for F
where
    F: FnMut(&ComparisonRequest<'_>) -> Result<ComparisonResult, ComparatorError>,
{
    fn compare(&mut self, request: &ComparisonRequest<'_>) -> Result<ComparisonResult, ComparatorError> {
        self(request)
    }
}
