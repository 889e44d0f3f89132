//! 帧交互性打分
//!
//! 每个信号独立计算，加权求和后得到交互性分数。分数只用于同一视频内的帧之间比较，
//! 不做整体归一化。所有权重与阈值都在 [`ScoringConfig`] 中，调参不需要改动算法结构。

use super::analysis::{connected_components, histogram, histogram_peaks, mean_abs_diff, mean_std, rgb_to_hsv};
use super::edges::{mask_density, EdgeDetector};
use super::frame::Frame;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// 各信号权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub cursor: f32,
    pub ui_state: f32,
    pub form: f32,
    pub modal: f32,
    pub temporal: f32,
    pub blankness: f32,
    pub complexity: f32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            cursor: 3.0,
            ui_state: 2.0,
            form: 2.5,
            modal: 2.0,
            temporal: 1.0,
            blankness: 1.5,
            complexity: 1.0,
        }
    }
}

/// HSV 色相区间（OpenCV 约定，0..180）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HueBand {
    pub min: u8,
    pub max: u8,
}

impl HueBand {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    fn contains(&self, hue: u8) -> bool {
        hue >= self.min && hue <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: SignalWeights,

    /// 近白像素阈值（灰度）
    pub cursor_brightness: u8,
    pub cursor_min_area: usize,
    pub cursor_max_area: usize,
    pub cursor_min_aspect: f32,
    pub cursor_max_aspect: f32,
    /// 计数乘以该系数后截断到 1.0
    pub cursor_count_scale: f32,

    /// 蓝 / 绿 / 橙
    pub highlight_bands: Vec<HueBand>,
    pub highlight_min_saturation: u8,
    pub highlight_min_value: u8,
    /// 单个色带像素数超过该值才计入
    pub highlight_min_pixels: usize,

    pub form_min_aspect: f32,
    pub form_max_aspect: f32,
    pub form_min_area: usize,
    pub form_max_area: usize,
    /// 像素数 / 外接矩形周长 的下限
    pub form_min_perimeter_coverage: f32,
    pub form_count_scale: f32,

    pub modal_peak_separation: usize,
    /// 峰值至少占全部像素的比例
    pub modal_min_peak_fraction: f32,
    pub modal_score: f32,

    pub blank_std_threshold: f32,
    pub low_detail_std_threshold: f32,
    pub low_detail_score: f32,

    pub edge_low_threshold: f32,
    pub edge_high_threshold: f32,
    pub complexity_scale: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            cursor_brightness: 240,
            cursor_min_area: 10,
            cursor_max_area: 200,
            cursor_min_aspect: 0.5,
            cursor_max_aspect: 2.0,
            cursor_count_scale: 1.0,
            highlight_bands: vec![
                HueBand::new(100, 130),
                HueBand::new(40, 80),
                HueBand::new(10, 25),
            ],
            highlight_min_saturation: 50,
            highlight_min_value: 50,
            highlight_min_pixels: 100,
            form_min_aspect: 2.0,
            form_max_aspect: 10.0,
            form_min_area: 500,
            form_max_area: 50_000,
            form_min_perimeter_coverage: 0.75,
            form_count_scale: 1.0,
            modal_peak_separation: 100,
            modal_min_peak_fraction: 0.01,
            modal_score: 0.5,
            blank_std_threshold: 10.0,
            low_detail_std_threshold: 30.0,
            low_detail_score: 0.3,
            edge_low_threshold: 50.0,
            edge_high_threshold: 150.0,
            complexity_scale: 10.0,
        }
    }
}

/// 单帧各信号的原始分（未加权）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalScores {
    pub cursor: f32,
    pub ui_state: f32,
    pub form: f32,
    pub modal: f32,
    /// 首尾帧没有双侧邻居，为 None
    pub temporal: Option<f32>,
    pub blankness: f32,
    pub complexity: f32,
}

impl SignalScores {
    pub fn total(&self, weights: &SignalWeights) -> f32 {
        self.cursor * weights.cursor
            + self.ui_state * weights.ui_state
            + self.form * weights.form
            + self.modal * weights.modal
            + self.temporal.unwrap_or(0.0) * weights.temporal
            + self.blankness * weights.blankness
            + self.complexity * weights.complexity
    }
}

pub struct FrameScorer {
    config: ScoringConfig,
    edges: EdgeDetector,
}

impl FrameScorer {
    pub fn new() -> Self {
        Self::with_config(ScoringConfig::default())
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        let edges = EdgeDetector::new(config.edge_low_threshold, config.edge_high_threshold);
        Self { config, edges }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// 交互性总分
    pub fn score(&self, frame: &Frame, prev: Option<&Frame>, next: Option<&Frame>) -> f32 {
        let gray = frame.to_gray();
        let prev_gray = prev.map(Frame::to_gray);
        let next_gray = next.map(Frame::to_gray);
        self.signals(frame, &gray, prev_gray.as_deref(), next_gray.as_deref())
            .total(&self.config.weights)
    }

    /// 灰度由调用方预先计算，方便在整段序列上复用
    pub fn signals(
        &self,
        frame: &Frame,
        gray: &[u8],
        prev_gray: Option<&[u8]>,
        next_gray: Option<&[u8]>,
    ) -> SignalScores {
        let width = frame.width as usize;
        let height = frame.height as usize;
        let edge_mask = self.edges.detect(gray, width, height);

        let scores = SignalScores {
            cursor: self.cursor_score(gray, width, height),
            ui_state: self.ui_state_score(frame),
            form: self.form_score(&edge_mask, width, height),
            modal: self.modal_score(gray),
            temporal: Self::temporal_score(gray, prev_gray, next_gray),
            blankness: self.blankness_score(gray),
            complexity: self.complexity_score(&edge_mask),
        };
        debug!("frame {} signals: {:?}", frame.index, scores);
        scores
    }

    /// 小块、近似方形的高亮连通域，视为鼠标指针
    fn cursor_score(&self, gray: &[u8], width: usize, height: usize) -> f32 {
        let c = &self.config;
        let mask: Vec<bool> = gray.iter().map(|&v| v >= c.cursor_brightness).collect();
        let count = connected_components(&mask, width, height)
            .iter()
            .filter(|comp| {
                let aspect = comp.aspect_ratio();
                comp.area >= c.cursor_min_area
                    && comp.area <= c.cursor_max_area
                    && aspect >= c.cursor_min_aspect
                    && aspect <= c.cursor_max_aspect
            })
            .count();
        (count as f32 * c.cursor_count_scale).min(1.0)
    }

    /// 蓝 / 绿 / 橙色高亮区域的像素占比
    fn ui_state_score(&self, frame: &Frame) -> f32 {
        let c = &self.config;
        let total = frame.pixel_count();
        if total == 0 {
            return 0.0;
        }

        let mut band_counts = vec![0usize; c.highlight_bands.len()];
        for px in frame.data.chunks_exact(4) {
            let (h, s, v) = rgb_to_hsv(px[0], px[1], px[2]);
            if s < c.highlight_min_saturation || v < c.highlight_min_value {
                continue;
            }
            for (band, count) in c.highlight_bands.iter().zip(band_counts.iter_mut()) {
                if band.contains(h) {
                    *count += 1;
                }
            }
        }

        let highlighted: usize = band_counts
            .into_iter()
            .filter(|&n| n > c.highlight_min_pixels)
            .sum();
        (highlighted as f32 / total as f32).min(1.0)
    }

    /// 横向矩形框（输入框、按钮）的数量
    fn form_score(&self, edge_mask: &[bool], width: usize, height: usize) -> f32 {
        let c = &self.config;
        let count = connected_components(edge_mask, width, height)
            .iter()
            .filter(|comp| {
                let aspect = comp.aspect_ratio();
                let area = comp.bbox_area();
                comp.is_rectangle_outline(c.form_min_perimeter_coverage)
                    && aspect >= c.form_min_aspect
                    && aspect <= c.form_max_aspect
                    && area >= c.form_min_area
                    && area <= c.form_max_area
            })
            .count();
        (count as f32 * c.form_count_scale).min(1.0)
    }

    /// 遮罩层 + 亮色对话框会形成相距较远的双峰直方图
    fn modal_score(&self, gray: &[u8]) -> f32 {
        let c = &self.config;
        let hist = histogram(gray);
        let min_count = (gray.len() as f32 * c.modal_min_peak_fraction).ceil() as u32;
        let peaks = histogram_peaks(&hist, min_count);
        match peaks.as_slice() {
            [first, second, ..] if first.abs_diff(*second) > c.modal_peak_separation => c.modal_score,
            _ => 0.0,
        }
    }

    fn temporal_score(gray: &[u8], prev: Option<&[u8]>, next: Option<&[u8]>) -> Option<f32> {
        let (prev, next) = (prev?, next?);
        let to_prev = mean_abs_diff(gray, prev);
        let to_next = mean_abs_diff(gray, next);
        match (to_prev, to_next) {
            (Some(a), Some(b)) => Some((a + b) / 2.0),
            _ => {
                warn!("temporal signal skipped: neighbour frame size mismatch");
                None
            }
        }
    }

    /// 近乎空白的帧得 0
    fn blankness_score(&self, gray: &[u8]) -> f32 {
        let c = &self.config;
        let (_, std) = mean_std(gray);
        if std < c.blank_std_threshold {
            0.0
        } else if std < c.low_detail_std_threshold {
            c.low_detail_score
        } else {
            1.0
        }
    }

    fn complexity_score(&self, edge_mask: &[bool]) -> f32 {
        (mask_density(edge_mask) * self.config.complexity_scale).min(1.0)
    }
}

impl Default for FrameScorer {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::test_frames::*;
    use super::*;

    #[test]
    fn test_black_frame_scores_zero() {
        let scorer = FrameScorer::new();
        let black = uniform(64, 48, [0, 0, 0], 0);
        let gray = black.to_gray();
        let s = scorer.signals(&black, &gray, None, None);

        assert_eq!(s.cursor, 0.0);
        assert_eq!(s.ui_state, 0.0);
        assert_eq!(s.form, 0.0);
        assert_eq!(s.modal, 0.0);
        assert_eq!(s.temporal, None);
        assert_eq!(s.blankness, 0.0);
        assert_eq!(s.complexity, 0.0);
        assert_eq!(scorer.score(&black, None, None), 0.0);
    }

    #[test]
    fn test_cursor_blob_detected() {
        let scorer = FrameScorer::new();
        let mut frame = uniform(100, 100, [50, 50, 50], 1);
        fill_rect(&mut frame, 40, 40, 48, 48, [255, 255, 255]);
        let gray = frame.to_gray();
        assert_eq!(scorer.signals(&frame, &gray, None, None).cursor, 1.0);

        // 大面积白色区域不算指针
        let mut big = uniform(100, 100, [50, 50, 50], 1);
        fill_rect(&mut big, 10, 10, 90, 90, [255, 255, 255]);
        let gray = big.to_gray();
        assert_eq!(scorer.signals(&big, &gray, None, None).cursor, 0.0);
    }

    #[test]
    fn test_highlight_fraction() {
        let scorer = FrameScorer::new();
        let mut frame = uniform(100, 100, [128, 128, 128], 0);
        fill_rect(&mut frame, 0, 0, 50, 20, [30, 80, 220]);
        let gray = frame.to_gray();
        let s = scorer.signals(&frame, &gray, None, None);
        assert!((s.ui_state - 0.1).abs() < 1e-4);

        // 低于像素数阈值的小色块被忽略
        let mut tiny = uniform(100, 100, [128, 128, 128], 0);
        fill_rect(&mut tiny, 0, 0, 5, 5, [30, 80, 220]);
        let gray = tiny.to_gray();
        assert_eq!(scorer.signals(&tiny, &gray, None, None).ui_state, 0.0);
    }

    #[test]
    fn test_modal_bimodal_histogram() {
        let scorer = FrameScorer::new();
        let mut frame = uniform(100, 100, [40, 40, 40], 0);
        fill_rect(&mut frame, 25, 25, 75, 75, [250, 250, 250]);
        let gray = frame.to_gray();
        assert_eq!(scorer.signals(&frame, &gray, None, None).modal, 0.5);

        let mut close = uniform(100, 100, [100, 100, 100], 0);
        fill_rect(&mut close, 25, 25, 75, 75, [150, 150, 150]);
        let gray = close.to_gray();
        assert_eq!(scorer.signals(&close, &gray, None, None).modal, 0.0);
    }

    #[test]
    fn test_temporal_needs_both_neighbours() {
        let scorer = FrameScorer::new();
        let dark = uniform(32, 32, [0, 0, 0], 0);
        let light = uniform(32, 32, [255, 255, 255], 1);
        let g_dark = dark.to_gray();
        let g_light = light.to_gray();

        let s = scorer.signals(&light, &g_light, Some(&g_dark), Some(&g_dark));
        assert_eq!(s.temporal, Some(1.0));
        let s = scorer.signals(&light, &g_light, Some(&g_dark), None);
        assert_eq!(s.temporal, None);
    }

    #[test]
    fn test_blankness_bands() {
        let scorer = FrameScorer::new();
        let mut low = uniform(100, 100, [100, 100, 100], 0);
        fill_rect(&mut low, 0, 0, 100, 50, [140, 140, 140]);
        let gray = low.to_gray();
        assert_eq!(scorer.signals(&low, &gray, None, None).blankness, 0.3);

        let mut high = uniform(100, 100, [0, 0, 0], 0);
        fill_rect(&mut high, 0, 0, 100, 50, [255, 255, 255]);
        let gray = high.to_gray();
        assert_eq!(scorer.signals(&high, &gray, None, None).blankness, 1.0);
    }

    #[test]
    fn test_form_fields_detected() {
        let scorer = FrameScorer::new();
        let frame = interactive(3);
        let gray = frame.to_gray();
        let s = scorer.signals(&frame, &gray, None, None);
        assert_eq!(s.form, 1.0);
        assert!(s.complexity > 0.0);
        assert!(s.ui_state > 0.0);
    }

    /// 浅色背景上 2px 深色边框的空心矩形
    fn outlined(width: u32, height: u32, rect: (u32, u32, u32, u32)) -> Frame {
        let (x0, y0, x1, y1) = rect;
        let mut frame = uniform(width, height, [240, 240, 240], 0);
        fill_rect(&mut frame, x0, y0, x1, y1, [60, 60, 60]);
        fill_rect(&mut frame, x0 + 2, y0 + 2, x1 - 2, y1 - 2, [240, 240, 240]);
        frame
    }

    fn form_of(scorer: &FrameScorer, frame: &Frame) -> f32 {
        let gray = frame.to_gray();
        scorer.signals(frame, &gray, None, None).form
    }

    #[test]
    fn test_elongated_bright_blob_is_not_cursor() {
        let mut frame = uniform(100, 100, [50, 50, 50], 1);
        fill_rect(&mut frame, 40, 20, 43, 70, [255, 255, 255]);
        let gray = frame.to_gray();
        assert_eq!(FrameScorer::new().signals(&frame, &gray, None, None).cursor, 0.0);

        // 放开宽高比限制后，同一块区域按面积就能通过
        let relaxed = FrameScorer::with_config(ScoringConfig {
            cursor_min_aspect: 0.0,
            ..ScoringConfig::default()
        });
        assert_eq!(relaxed.signals(&frame, &gray, None, None).cursor, 1.0);
    }

    #[test]
    fn test_square_outline_is_not_form_field() {
        let scorer = FrameScorer::new();
        assert_eq!(form_of(&scorer, &outlined(200, 200, (60, 60, 140, 140))), 0.0);
    }

    #[test]
    fn test_form_area_bounds() {
        let scorer = FrameScorer::new();
        // 3:1，外接矩形不足 500
        assert_eq!(form_of(&scorer, &outlined(100, 60, (30, 20, 60, 30))), 0.0);
        // 2.1:1，外接矩形超过 50000
        assert_eq!(form_of(&scorer, &outlined(460, 240, (20, 20, 440, 220))), 0.0);
    }

    #[test]
    fn test_form_bounds_come_from_config() {
        let frame = interactive(2);
        assert_eq!(form_of(&FrameScorer::new(), &frame), 1.0);

        let tight_area = FrameScorer::with_config(ScoringConfig {
            form_max_area: 1000,
            ..ScoringConfig::default()
        });
        assert_eq!(form_of(&tight_area, &frame), 0.0);

        let huge_min_area = FrameScorer::with_config(ScoringConfig {
            form_min_area: 100_000,
            ..ScoringConfig::default()
        });
        assert_eq!(form_of(&huge_min_area, &frame), 0.0);

        let narrow_aspect = FrameScorer::with_config(ScoringConfig {
            form_min_aspect: 20.0,
            form_max_aspect: 30.0,
            ..ScoringConfig::default()
        });
        assert_eq!(form_of(&narrow_aspect, &frame), 0.0);
    }

    #[test]
    fn test_interactive_outscores_blank() {
        let scorer = FrameScorer::new();
        let blank = uniform(200, 150, [10, 10, 10], 0);
        let ui = interactive(1);
        assert!(scorer.score(&ui, None, None) > scorer.score(&blank, None, None));
    }

    #[test]
    fn test_weights_apply() {
        let scores = SignalScores {
            cursor: 1.0,
            ui_state: 0.5,
            form: 1.0,
            modal: 0.5,
            temporal: Some(0.2),
            blankness: 1.0,
            complexity: 0.4,
        };
        let total = scores.total(&SignalWeights::default());
        let expected = 3.0 + 1.0 + 2.5 + 1.0 + 0.2 + 1.5 + 0.4;
        assert!((total - expected).abs() < 1e-5);
    }
}
