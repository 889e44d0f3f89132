//! 作品评测入口

use crate::core::config::EvaluationConfig;
use crate::core::ranking::{Comparator, ProgressSink, RankingEngine, RankingError, Submission};
use crate::core::video::{FrameScorer, FrameSelector, FrameSource, FrameStore, VideoError};
use log::{error, info};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Need at least 2 submissions to evaluate, found {found}")]
    NotEnoughSubmissions { found: usize },
    #[error(transparent)]
    Video(#[from] VideoError),
    #[error(transparent)]
    Ranking(#[from] RankingError),
}

/// 作品评测器 - 重新抽关键帧 + 两两比较排名
///
/// ```ignore
/// let mut evaluator = SubmissionEvaluator::create(config, ImageSequenceSource::new());
/// let ranked = evaluator.evaluate(submissions, &task, &criteria, &mut judge, &mut progress)?;
/// ```
pub struct SubmissionEvaluator<S: FrameSource> {
    source: S,
    selector: FrameSelector,
    store: FrameStore,
    engine: RankingEngine,
}

impl<S: FrameSource> SubmissionEvaluator<S> {
    pub fn create(config: EvaluationConfig, source: S) -> Self {
        info!(
            "🎬 SubmissionEvaluator: created (frames in {:?}, {:?})",
            config.frames_root, config.ranking.strategy
        );
        Self {
            source,
            selector: FrameSelector::with_config(
                config.selector,
                FrameScorer::with_config(config.scoring),
            ),
            store: FrameStore::new(config.frames_root, config.jpeg_quality),
            engine: RankingEngine::with_config(config.ranking),
        }
    }

    pub fn engine(&self) -> &RankingEngine {
        &self.engine
    }

    /// 解码、选帧并落盘，返回关键帧路径
    pub fn extract_frames(&self, submission: &Submission) -> Result<Vec<PathBuf>, VideoError> {
        let frames = self.source.decode(&submission.video_path)?;
        let decoded = frames.len();
        let selected = self.selector.select_key_frames(frames);
        info!(
            "🎞️ {}: kept {} of {} frames",
            submission.id,
            selected.len(),
            decoded
        );
        self.store.persist(&submission.id, &selected)
    }

    /// 完整评测：逐个重新抽帧，清空比较缓存，排名并写入名次
    pub fn evaluate<C, P>(
        &mut self,
        submissions: Vec<Submission>,
        task_description: &str,
        criteria: &[String],
        comparator: &mut C,
        progress: &mut P,
    ) -> Result<Vec<Submission>, EvaluationError>
    where
        C: Comparator + ?Sized,
        P: ProgressSink + ?Sized,
    {
        if submissions.len() < 2 {
            return Err(EvaluationError::NotEnoughSubmissions {
                found: submissions.len(),
            });
        }

        progress.report("Starting evaluation...");
        match self.run_evaluation(submissions, task_description, criteria, comparator, progress) {
            Ok(ranked) => {
                progress.report("Evaluation completed!");
                info!("🏆 evaluation completed for {} submissions", ranked.len());
                Ok(ranked)
            }
            Err(e) => {
                error!("❌ evaluation failed: {}", e);
                progress.report(&format!("Evaluation failed: {}", e));
                Err(e)
            }
        }
    }

    fn run_evaluation<C, P>(
        &mut self,
        mut submissions: Vec<Submission>,
        task_description: &str,
        criteria: &[String],
        comparator: &mut C,
        progress: &mut P,
    ) -> Result<Vec<Submission>, EvaluationError>
    where
        C: Comparator + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let total = submissions.len();
        for (i, submission) in submissions.iter_mut().enumerate() {
            progress.report(&format!(
                "Extracting frames for {} ({}/{})",
                submission.applicant_name,
                i + 1,
                total
            ));
            submission.key_frames = self.extract_frames(submission)?;
        }

        // 帧已重新生成，旧的比较结论作废
        self.engine.clear_cache();
        let mut ranked =
            self.engine
                .rank(submissions, task_description, criteria, comparator, progress)?;
        for (idx, submission) in ranked.iter_mut().enumerate() {
            submission.rank = Some(idx as u32 + 1);
        }
        Ok(ranked)
    }
}

impl<S: FrameSource> Drop for SubmissionEvaluator<S> {
    fn drop(&mut self) {
        info!("🗑️ SubmissionEvaluator: released");
    }
}
