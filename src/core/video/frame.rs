use super::error::VideoError;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use std::io::Cursor;
use std::time::Duration;

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA 格式
    pub timestamp: Duration,
    /// 在解码序列中的时间序号
    pub index: usize,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, timestamp_ms: u64, index: usize) -> Self {
        Self {
            width,
            height,
            data,
            timestamp: Duration::from_millis(timestamp_ms),
            index,
        }
    }

    /// 校验缓冲区长度后构造
    pub fn from_rgba(
        width: u32,
        height: u32,
        data: Vec<u8>,
        timestamp_ms: u64,
        index: usize,
    ) -> Result<Self, VideoError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(VideoError::InvalidFrame {
                index,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::new(width, height, data, timestamp_ms, index))
    }

    pub fn from_image(image: DynamicImage, timestamp_ms: u64, index: usize) -> Self {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw(), timestamp_ms, index)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
        for chunk in self.data.chunks_exact(4) {
            rgb.extend_from_slice(&chunk[..3]);
        }
        rgb
    }

    /// 灰度（BT.601 整数近似）
    pub fn to_gray(&self) -> Vec<u8> {
        self.data
            .chunks_exact(4)
            .map(|rgba| {
                ((rgba[0] as u32 * 299 + rgba[1] as u32 * 587 + rgba[2] as u32 * 114) / 1000) as u8
            })
            .collect()
    }

    /// JPEG 不支持 alpha，先丢弃透明通道
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, VideoError> {
        let rgb = RgbImage::from_raw(self.width, self.height, self.to_rgb()).ok_or(
            VideoError::InvalidFrame {
                index: self.index,
                expected: self.pixel_count() * 4,
                actual: self.data.len(),
            },
        )?;

        let mut buffer = Cursor::new(Vec::new());
        rgb.write_to(&mut buffer, ImageOutputFormat::Jpeg(quality))?;
        Ok(buffer.into_inner())
    }
}
