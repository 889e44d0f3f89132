use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Frame {index} has {actual} bytes, expected {expected}")]
    InvalidFrame {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("No frames found at {0:?}")]
    NoFrames(PathBuf),
    #[error("Decode failed: {0}")]
    Decode(String),
}
