//! 评测配置，JSON 加载，缺省字段取默认值

use crate::core::ranking::RankingConfig;
use crate::core::video::{ScoringConfig, SelectorConfig};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// 关键帧落盘根目录，每份作品一个子目录
    pub frames_root: PathBuf,
    pub jpeg_quality: u8,
    pub scoring: ScoringConfig,
    pub selector: SelectorConfig,
    pub ranking: RankingConfig,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            frames_root: PathBuf::from("frames"),
            jpeg_quality: 95,
            scoring: ScoringConfig::default(),
            selector: SelectorConfig::default(),
            ranking: RankingConfig::default(),
        }
    }
}

impl EvaluationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_json_str(&fs::read_to_string(path)?)?;
        info!("⚙️ loaded evaluation config from {:?}", path);
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ranking::{FeedbackPolicy, RankingStrategy};

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(
            EvaluationConfig::from_json_str("{}").unwrap(),
            EvaluationConfig::default()
        );
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "frames_root": "/tmp/key_frames",
            "selector": {"target_count": 6, "parallel_scoring": true},
            "scoring": {"weights": {"cursor": 5.0}},
            "ranking": {"feedback_policy": "aggregate"}
        }"#;
        let config = EvaluationConfig::from_json_str(json).unwrap();
        assert_eq!(config.frames_root, PathBuf::from("/tmp/key_frames"));
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.selector.target_count, 6);
        assert_eq!(config.selector.tolerance, 1);
        assert!(config.selector.parallel_scoring);
        assert_eq!(config.scoring.weights.cursor, 5.0);
        assert_eq!(config.scoring.weights.form, 2.5);
        assert_eq!(config.ranking.strategy, RankingStrategy::RoundRobin);
        assert_eq!(config.ranking.feedback_policy, FeedbackPolicy::Aggregate);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.json");
        fs::write(&path, r#"{"jpeg_quality": 80}"#).unwrap();
        assert_eq!(EvaluationConfig::load(&path).unwrap().jpeg_quality, 80);

        let missing = EvaluationConfig::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = EvaluationConfig::from_json_str("{\"jpeg_quality\": \"high\"}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
