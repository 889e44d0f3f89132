//! 关键帧选择
//!
//! 1. 丢弃首帧（通常是黑屏 / 加载帧）
//! 2. 剩余帧数不超过 目标数 + 容差 时直接全部返回
//! 3. 否则逐帧打交互性分数，按分数从高到低贪心选取，并与已选帧保持最小时间间隔
//! 4. 数量不足时按时间顺序补齐（与已选帧间隔大于 `fill_min_distance`）
//! 5. 结果按原始时间顺序返回
//!
//! 同分时按时间顺序靠前者优先，因此结果完全确定。

use super::frame::Frame;
use super::scorer::FrameScorer;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub target_count: usize,
    pub tolerance: usize,
    pub fill_min_distance: usize,
    pub parallel_scoring: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            target_count: 8,
            tolerance: 1,
            fill_min_distance: 5,
            parallel_scoring: false,
        }
    }
}

impl SelectorConfig {
    pub fn thorough() -> Self {
        Self {
            target_count: 12,
            ..Self::default()
        }
    }

    pub fn compact() -> Self {
        Self {
            target_count: 4,
            ..Self::default()
        }
    }
}

pub struct FrameSelector {
    config: SelectorConfig,
    scorer: FrameScorer,
    /// 仅在 `parallel_scoring` 开启时创建
    pool: Option<rayon::ThreadPool>,
}

impl FrameSelector {
    pub fn new() -> Self {
        Self::with_config(SelectorConfig::default(), FrameScorer::new())
    }

    pub fn with_config(config: SelectorConfig, scorer: FrameScorer) -> Self {
        let pool = if config.parallel_scoring {
            let threads = num_cpus::get().min(4);
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => {
                    debug!("🧵 scoring pool ready with {} threads", threads);
                    Some(pool)
                }
                Err(e) => {
                    warn!("⚠️ scoring pool unavailable, falling back to sequential: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Self {
            config,
            scorer,
            pool,
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// 按配置的目标数选帧
    pub fn select_key_frames(&self, frames: Vec<Frame>) -> Vec<Frame> {
        self.select(frames, self.config.target_count)
    }

    pub fn select(&self, frames: Vec<Frame>, target_count: usize) -> Vec<Frame> {
        let total = frames.len();
        let remaining: Vec<Frame> = frames.into_iter().skip(1).collect();

        if target_count == 0 {
            return Vec::new();
        }
        if remaining.len() <= target_count.saturating_add(self.config.tolerance) {
            debug!(
                "🎞️ {} usable frames within target {}, keeping all",
                remaining.len(),
                target_count
            );
            return remaining;
        }

        let scores = self.score_all(&remaining);
        let min_gap = remaining.len() / target_count.saturating_mul(2);
        let chosen = pick_positions(&scores, target_count, min_gap, self.config.fill_min_distance);

        let mut keep = vec![false; remaining.len()];
        for &pos in &chosen {
            keep[pos] = true;
        }
        let selected: Vec<Frame> = remaining
            .into_iter()
            .zip(keep)
            .filter_map(|(frame, kept)| kept.then_some(frame))
            .collect();

        info!(
            "🎬 selected {} of {} frames (min gap {})",
            selected.len(),
            total,
            min_gap
        );
        selected
    }

    /// 每帧的交互性总分，时间邻居取序列中的前后帧
    pub fn score_all(&self, frames: &[Frame]) -> Vec<f32> {
        let grays: Vec<Vec<u8>> = frames.iter().map(Frame::to_gray).collect();
        let weights = &self.scorer.config().weights;

        let score_at = |i: usize| {
            let prev = i.checked_sub(1).map(|p| grays[p].as_slice());
            let next = grays.get(i + 1).map(Vec::as_slice);
            self.scorer
                .signals(&frames[i], &grays[i], prev, next)
                .total(weights)
        };

        match &self.pool {
            Some(pool) => pool.install(|| (0..frames.len()).into_par_iter().map(score_at).collect()),
            None => (0..frames.len()).map(score_at).collect(),
        }
    }
}

impl Default for FrameSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// 返回升序排列的位置
fn pick_positions(
    scores: &[f32],
    target_count: usize,
    min_gap: usize,
    fill_min_distance: usize,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    let mut accepted: Vec<usize> = Vec::with_capacity(target_count);
    for pos in order {
        if accepted.len() >= target_count {
            break;
        }
        if accepted.iter().all(|&a| a.abs_diff(pos) > min_gap) {
            accepted.push(pos);
        }
    }

    if accepted.len() < target_count {
        for pos in 0..scores.len() {
            if accepted.len() >= target_count {
                break;
            }
            if accepted.iter().all(|&a| a.abs_diff(pos) > fill_min_distance) {
                accepted.push(pos);
            }
        }
    }

    accepted.sort_unstable();
    accepted
}
