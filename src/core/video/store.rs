//! 帧来源与关键帧落盘

use super::error::VideoError;
use super::frame::Frame;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// 解码后的视频帧提供者
pub trait FrameSource {
    /// 按时间顺序返回整段视频的帧
    fn decode(&self, video: &Path) -> Result<Vec<Frame>, VideoError>;
}

/// 把一个目录下的图片（按文件名排序）当作已解码的视频
pub struct ImageSequenceSource {
    /// 相邻帧的时间间隔（毫秒）
    frame_interval_ms: u64,
}

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

impl ImageSequenceSource {
    pub fn new() -> Self {
        Self::with_fps(30)
    }

    pub fn with_fps(fps: u32) -> Self {
        Self {
            frame_interval_ms: 1000 / u64::from(fps.max(1)),
        }
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl Default for ImageSequenceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ImageSequenceSource {
    fn decode(&self, video: &Path) -> Result<Vec<Frame>, VideoError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(video)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && Self::is_image(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(VideoError::NoFrames(video.to_path_buf()));
        }

        let mut frames = Vec::with_capacity(paths.len());
        for (index, path) in paths.iter().enumerate() {
            let image = image::open(path)?;
            frames.push(Frame::from_image(
                image,
                index as u64 * self.frame_interval_ms,
                index,
            ));
        }
        debug!("📂 decoded {} frames from {:?}", frames.len(), video);
        Ok(frames)
    }
}

/// 关键帧存储：`<root>/<submission id>/frame_NNNN.jpg`
pub struct FrameStore {
    root: PathBuf,
    jpeg_quality: u8,
}

impl FrameStore {
    pub fn new(root: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        Self {
            root: root.into(),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn submission_dir(&self, submission_id: &str) -> PathBuf {
        self.root.join(submission_id)
    }

    /// 清空旧帧后按顺序写入，返回文件路径
    pub fn persist(&self, submission_id: &str, frames: &[Frame]) -> Result<Vec<PathBuf>, VideoError> {
        let dir = self.submission_dir(submission_id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;

        let mut paths = Vec::with_capacity(frames.len());
        for (i, frame) in frames.iter().enumerate() {
            let path = dir.join(format!("frame_{:04}.jpg", i));
            fs::write(&path, frame.encode_jpeg(self.jpeg_quality)?)?;
            paths.push(path);
        }

        info!("💾 persisted {} frames to {:?}", paths.len(), dir);
        Ok(paths)
    }
}

/// 读取前 `limit` 个帧文件并做 base64 编码；缺失或读取失败的文件跳过
pub fn encode_frame_files(paths: &[PathBuf], limit: usize) -> Vec<String> {
    paths
        .iter()
        .take(limit)
        .filter_map(|path| match fs::read(path) {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(e) => {
                warn!("⚠️ skipping frame {:?}: {}", path, e);
                None
            }
        })
        .collect()
}
