//! 两两比较排名引擎
//!
//! 每次排名独立计分，比较结果按有序 id 对缓存，跨多次排名复用。

use super::comparator::{Comparator, ComparisonRequest};
use super::error::RankingError;
use super::progress::ProgressSink;
use super::strategy::{self, RankingStrategy};
use super::types::{ComparisonResult, ProsCons, Record, Standing, Submission, Winner};
use crate::core::video::encode_frame_files;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 评价文字的取舍方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackPolicy {
    /// 只保留作品第一次参与比较时得到的评价
    #[default]
    FirstComparison,
    /// 评价取第一次，优缺点合并所有比较
    Aggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub strategy: RankingStrategy,
    pub feedback_policy: FeedbackPolicy,
    /// 每次比较每一方最多发送的关键帧数
    pub frames_per_comparison: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            strategy: RankingStrategy::RoundRobin,
            feedback_policy: FeedbackPolicy::FirstComparison,
            frames_per_comparison: 4,
        }
    }
}

/// 比较结果缓存，键为 (A id, B id)，顺序敏感
#[derive(Debug, Default)]
pub struct ComparisonCache {
    entries: HashMap<(String, String), ComparisonResult>,
}

impl ComparisonCache {
    pub fn get(&self, id_a: &str, id_b: &str) -> Option<&ComparisonResult> {
        self.entries.get(&(id_a.to_string(), id_b.to_string()))
    }

    pub fn insert(&mut self, id_a: String, id_b: String, result: ComparisonResult) {
        self.entries.insert((id_a, id_b), result);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 一次排名的完整结果
#[derive(Debug, Clone, Default)]
pub struct RankingOutcome {
    /// 最终顺序，已填写 percentile
    pub submissions: Vec<Submission>,
    /// 与 `submissions` 一一对应
    pub standings: Vec<Standing>,
    /// 发生的比较次数（含缓存命中）
    pub comparisons: usize,
    /// 实际调用裁判的次数
    pub comparator_calls: usize,
}

/// 名次对应的百分位，保留一位小数。
/// 按浮点数的精确十进制值舍入（0.05 实际略大于 0.05，进位为 0.1）。
pub fn percentile(position: usize, total: usize) -> f64 {
    if total == 0 || position >= total {
        return 0.0;
    }
    let raw = 100.0 * (total - position) as f64 / total as f64;
    format!("{:.1}", raw).parse().unwrap_or(raw)
}

pub struct RankingEngine {
    config: RankingConfig,
    cache: ComparisonCache,
}

impl RankingEngine {
    pub fn new() -> Self {
        Self::with_config(RankingConfig::default())
    }

    pub fn with_config(config: RankingConfig) -> Self {
        Self {
            config,
            cache: ComparisonCache::default(),
        }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn cache(&self) -> &ComparisonCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        debug!("🧹 clearing {} cached comparisons", self.cache.len());
        self.cache.clear();
    }

    /// 返回按名次排好的作品，每份都带 percentile
    pub fn rank<C, P>(
        &mut self,
        submissions: Vec<Submission>,
        task_description: &str,
        criteria: &[String],
        comparator: &mut C,
        progress: &mut P,
    ) -> Result<Vec<Submission>, RankingError>
    where
        C: Comparator + ?Sized,
        P: ProgressSink + ?Sized,
    {
        self.run(submissions, task_description, criteria, comparator, progress)
            .map(|outcome| outcome.submissions)
    }

    /// 同 [`rank`](Self::rank)，额外返回战绩与调用统计
    pub fn run<C, P>(
        &mut self,
        submissions: Vec<Submission>,
        task_description: &str,
        criteria: &[String],
        comparator: &mut C,
        progress: &mut P,
    ) -> Result<RankingOutcome, RankingError>
    where
        C: Comparator + ?Sized,
        P: ProgressSink + ?Sized,
    {
        check_unique_ids(&submissions)?;
        if submissions.is_empty() {
            return Ok(RankingOutcome::default());
        }

        info!(
            "🏁 ranking {} submissions ({:?}, {} cached)",
            submissions.len(),
            self.config.strategy,
            self.cache.len()
        );

        let mut tournament = Tournament::new(
            submissions,
            task_description,
            criteria,
            comparator,
            progress,
            &mut self.cache,
            &self.config,
        );
        let order = match self.config.strategy {
            RankingStrategy::RoundRobin => strategy::round_robin(&mut tournament)?,
            RankingStrategy::BinaryInsertion => strategy::binary_insertion(&mut tournament)?,
        };
        let outcome = tournament.finish(order);

        info!(
            "✅ ranking complete: {} comparisons, {} comparator calls",
            outcome.comparisons, outcome.comparator_calls
        );
        Ok(outcome)
    }
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn check_unique_ids(submissions: &[Submission]) -> Result<(), RankingError> {
    let mut seen = HashSet::with_capacity(submissions.len());
    for sub in submissions {
        if !seen.insert(sub.id.as_str()) {
            return Err(RankingError::DuplicateSubmission(sub.id.clone()));
        }
    }
    Ok(())
}

/// 单次排名的状态：作品、战绩、评价是否已写入
pub(crate) struct Tournament<'a, C: ?Sized, P: ?Sized> {
    submissions: Vec<Submission>,
    records: Vec<Record>,
    feedback_seen: Vec<bool>,
    task_description: &'a str,
    criteria: &'a [String],
    comparator: &'a mut C,
    progress: &'a mut P,
    cache: &'a mut ComparisonCache,
    config: &'a RankingConfig,
    comparisons: usize,
    comparator_calls: usize,
}

impl<'a, C, P> Tournament<'a, C, P>
where
    C: Comparator + ?Sized,
    P: ProgressSink + ?Sized,
{
    fn new(
        submissions: Vec<Submission>,
        task_description: &'a str,
        criteria: &'a [String],
        comparator: &'a mut C,
        progress: &'a mut P,
        cache: &'a mut ComparisonCache,
        config: &'a RankingConfig,
    ) -> Self {
        let n = submissions.len();
        Self {
            submissions,
            records: vec![Record::default(); n],
            feedback_seen: vec![false; n],
            task_description,
            criteria,
            comparator,
            progress,
            cache,
            config,
            comparisons: 0,
            comparator_calls: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.submissions.len()
    }

    pub(crate) fn name(&self, idx: usize) -> &str {
        &self.submissions[idx].applicant_name
    }

    pub(crate) fn records(&self) -> &[Record] {
        &self.records
    }

    pub(crate) fn report(&mut self, message: &str) {
        self.progress.report(message);
    }

    /// 比较 `a`（A 方）与 `b`（B 方），更新战绩和评价。
    /// `planned` 为本次排名预计的比较总数，未知时为 None。
    pub(crate) fn compare(
        &mut self,
        a: usize,
        b: usize,
        planned: Option<usize>,
    ) -> Result<Winner, RankingError> {
        self.comparisons += 1;
        let message = match planned {
            Some(total) => format!(
                "Comparing {} vs {} (comparison {}/{})",
                self.name(a),
                self.name(b),
                self.comparisons,
                total
            ),
            None => format!(
                "Comparing {} vs {} (comparison {})",
                self.name(a),
                self.name(b),
                self.comparisons
            ),
        };
        self.report(&message);

        let result = match self
            .cache
            .get(&self.submissions[a].id, &self.submissions[b].id)
        {
            Some(hit) => {
                debug!(
                    "♻️ cache hit {} vs {}",
                    self.submissions[a].id, self.submissions[b].id
                );
                hit.clone()
            }
            None => self.ask_comparator(a, b)?,
        };

        self.records[a].total_comparisons += 1;
        self.records[b].total_comparisons += 1;
        match result.winner {
            Winner::A => self.records[a].wins += 1,
            Winner::B => self.records[b].wins += 1,
        }

        self.apply_feedback(a, &result.feedback_a, &result.pros_cons_a);
        self.apply_feedback(b, &result.feedback_b, &result.pros_cons_b);
        Ok(result.winner)
    }

    fn ask_comparator(&mut self, a: usize, b: usize) -> Result<ComparisonResult, RankingError> {
        let limit = self.config.frames_per_comparison;
        let sub_a = &self.submissions[a];
        let sub_b = &self.submissions[b];
        let frames_a = encode_frame_files(&sub_a.key_frames, limit);
        let frames_b = encode_frame_files(&sub_b.key_frames, limit);

        let request = ComparisonRequest {
            frames_a: &frames_a,
            frames_b: &frames_b,
            task_description: self.task_description,
            criteria: self.criteria,
            name_a: &sub_a.applicant_name,
            name_b: &sub_b.applicant_name,
        };

        self.comparator_calls += 1;
        let result = match self.comparator.compare(&request) {
            Ok(result) => result,
            Err(e) => {
                error!("❌ comparison {} vs {} failed: {}", sub_a.id, sub_b.id, e);
                return Err(e.into());
            }
        };

        debug!("⚖️ {} vs {} -> {:?}", sub_a.id, sub_b.id, result.winner);
        self.cache
            .insert(sub_a.id.clone(), sub_b.id.clone(), result.clone());
        Ok(result)
    }

    fn apply_feedback(&mut self, idx: usize, feedback: &str, pros_cons: &ProsCons) {
        let sub = &mut self.submissions[idx];
        if !self.feedback_seen[idx] {
            sub.feedback = Some(feedback.to_string());
            sub.pros_cons = Some(pros_cons.clone());
            self.feedback_seen[idx] = true;
        } else if self.config.feedback_policy == FeedbackPolicy::Aggregate {
            sub.pros_cons
                .get_or_insert_with(ProsCons::default)
                .merge(pros_cons);
        }
    }

    /// 按 `order` 输出作品并填写 percentile
    fn finish(self, order: Vec<usize>) -> RankingOutcome {
        let total = order.len();
        let mut slots: Vec<Option<Submission>> = self.submissions.into_iter().map(Some).collect();
        let mut submissions = Vec::with_capacity(total);
        let mut standings = Vec::with_capacity(total);

        for (position, idx) in order.into_iter().enumerate() {
            let Some(mut sub) = slots.get_mut(idx).and_then(Option::take) else {
                continue;
            };
            let record = self.records[idx];
            sub.percentile = Some(percentile(position, total));
            standings.push(Standing {
                submission_id: sub.id.clone(),
                wins: record.wins,
                total_comparisons: record.total_comparisons,
                win_rate: record.win_rate(),
            });
            submissions.push(sub);
        }

        RankingOutcome {
            submissions,
            standings,
            comparisons: self.comparisons,
            comparator_calls: self.comparator_calls,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::ranking::comparator::ComparatorError;

    pub fn subs(names: &[&str]) -> Vec<Submission> {
        names
            .iter()
            .map(|name| {
                Submission::new(
                    *name,
                    format!("{}@example.com", name.to_lowercase()),
                    *name,
                    format!("/videos/{}.mp4", name),
                )
            })
            .collect()
    }

    pub fn ids(submissions: &[Submission]) -> Vec<&str> {
        submissions.iter().map(|s| s.id.as_str()).collect()
    }

    /// 按规则判定胜负的假裁判，记录每次调用
    pub struct Judge {
        rule: fn(&str, &str) -> Winner,
        pub calls: Vec<(String, String)>,
        pub frame_counts: Vec<(usize, usize)>,
        pub fail_on_call: Option<usize>,
    }

    impl Judge {
        pub fn new(rule: fn(&str, &str) -> Winner) -> Self {
            Self {
                rule,
                calls: Vec::new(),
                frame_counts: Vec::new(),
                fail_on_call: None,
            }
        }

        pub fn always(winner: Winner) -> Self {
            match winner {
                Winner::A => Self::new(|_, _| Winner::A),
                Winner::B => Self::new(|_, _| Winner::B),
            }
        }
    }

    impl Comparator for Judge {
        fn compare(
            &mut self,
            request: &ComparisonRequest<'_>,
        ) -> Result<ComparisonResult, ComparatorError> {
            self.calls
                .push((request.name_a.to_string(), request.name_b.to_string()));
            self.frame_counts
                .push((request.frames_a.len(), request.frames_b.len()));
            let call = self.calls.len();
            if self.fail_on_call == Some(call) {
                return Err(ComparatorError::Unavailable("quota exhausted".into()));
            }
            Ok(ComparisonResult {
                winner: (self.rule)(request.name_a, request.name_b),
                feedback_a: format!("{} as A in call {}", request.name_a, call),
                feedback_b: format!("{} as B in call {}", request.name_b, call),
                pros_cons_a: ProsCons::new(vec![format!("pro-{}", call)], vec![]),
                pros_cons_b: ProsCons::new(vec![], vec![format!("con-{}", call)]),
            })
        }
    }
}
