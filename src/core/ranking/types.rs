use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 优缺点列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProsCons {
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

impl ProsCons {
    pub fn new(pros: Vec<String>, cons: Vec<String>) -> Self {
        Self { pros, cons }
    }

    /// 合并另一份列表，去重并保持首次出现的顺序
    pub fn merge(&mut self, other: &ProsCons) {
        for pro in &other.pros {
            if !self.pros.contains(pro) {
                self.pros.push(pro.clone());
            }
        }
        for con in &other.cons {
            if !self.cons.contains(con) {
                self.cons.push(con.clone());
            }
        }
    }
}

/// 胜者按传入顺序标记：A 为第一个参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
}

/// 一次两两比较的结论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub winner: Winner,
    pub feedback_a: String,
    pub feedback_b: String,
    pub pros_cons_a: ProsCons,
    pub pros_cons_b: ProsCons,
}

impl ComparisonResult {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// 一份候选作品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub applicant_email: String,
    pub applicant_name: String,
    pub video_path: PathBuf,
    /// 已落盘的关键帧，按时间顺序
    #[serde(default)]
    pub key_frames: Vec<PathBuf>,
    /// 1 起始
    #[serde(default)]
    pub rank: Option<u32>,
    /// 0-100，保留一位小数
    #[serde(default)]
    pub percentile: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub pros_cons: Option<ProsCons>,
}

impl Submission {
    pub fn new(
        id: impl Into<String>,
        applicant_email: impl Into<String>,
        applicant_name: impl Into<String>,
        video_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            applicant_email: applicant_email.into(),
            applicant_name: applicant_name.into(),
            video_path: video_path.into(),
            key_frames: Vec::new(),
            rank: None,
            percentile: None,
            feedback: None,
            pros_cons: None,
        }
    }
}

/// 单次排名过程中的战绩
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Record {
    pub wins: u32,
    pub total_comparisons: u32,
}

impl Record {
    pub fn win_rate(&self) -> f64 {
        if self.total_comparisons == 0 {
            0.0
        } else {
            self.wins as f64 / self.total_comparisons as f64
        }
    }
}

/// 最终名次对应的战绩快照
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub submission_id: String,
    pub wins: u32,
    pub total_comparisons: u32,
    pub win_rate: f64,
}
