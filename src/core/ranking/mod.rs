pub mod comparator;
pub mod engine;
pub mod error;
pub mod progress;
pub mod strategy;
pub mod types;

pub use comparator::{Comparator, ComparatorError, ComparisonRequest};
pub use engine::{
    percentile, ComparisonCache, FeedbackPolicy, RankingConfig, RankingEngine, RankingOutcome,
};
pub use error::RankingError;
pub use progress::{ChannelProgress, ProgressSink};
pub use strategy::RankingStrategy;
pub use types::{ComparisonResult, ProsCons, Record, Standing, Submission, Winner};
