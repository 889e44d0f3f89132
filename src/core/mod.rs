pub mod config;
pub mod ranking;
pub mod video;
