pub mod analysis;
pub mod edges;
pub mod error;
pub mod frame;
pub mod scorer;
pub mod selector;
pub mod store;

pub use error::VideoError;
pub use frame::Frame;
pub use scorer::{FrameScorer, HueBand, ScoringConfig, SignalScores, SignalWeights};
pub use selector::{FrameSelector, SelectorConfig};
pub use store::{encode_frame_files, FrameSource, FrameStore, ImageSequenceSource};
