use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KernelError;

/// Namespace partitioning bandit arms. Arms are never compared across scopes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Content,
    Reply,
    Timing,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Content, Scope::Reply, Scope::Timing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Content => "content",
            Scope::Reply => "reply",
            Scope::Timing => "timing",
        }
    }

    /// Selection algorithm used for arms in this scope.
    pub fn algorithm(&self) -> SelectionAlgorithm {
        match self {
            Scope::Content | Scope::Reply => SelectionAlgorithm::ThompsonSampling,
            Scope::Timing => SelectionAlgorithm::Ucb1,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content" => Ok(Scope::Content),
            "reply" => Ok(Scope::Reply),
            "timing" => Ok(Scope::Timing),
            other => Err(KernelError::Config(format!("unknown scope: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionAlgorithm {
    ThompsonSampling,
    Ucb1,
}

impl fmt::Display for SelectionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionAlgorithm::ThompsonSampling => f.write_str("thompson_sampling"),
            SelectionAlgorithm::Ucb1 => f.write_str("ucb1"),
        }
    }
}

/// Metadata supplied by the content collaborator alongside the post text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContentMetadata {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub fact_source: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub thread_length: Option<u32>,
    #[serde(default)]
    pub hook_type: Option<String>,
    #[serde(default)]
    pub cta_type: Option<String>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    /// Hour of day, 0-23.
    #[serde(default)]
    pub hour_posted: Option<u32>,
    /// Day of week, 0 = Sunday.
    #[serde(default)]
    pub day_of_week: Option<u32>,
}

/// Raw engagement counters from the metrics collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngagementCounters {
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
    pub bookmarks: u64,
    pub impressions: u64,
    #[serde(default)]
    pub followers_delta_24h: Option<i64>,
    #[serde(default)]
    pub interactions_from_nonfollowers: Option<u64>,
}

/// Result of a bandit selection handed to the scheduling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmSelection {
    pub arm_id: String,
    pub expected_reward: f64,
    pub algorithm: SelectionAlgorithm,
    pub reason: String,
}

/// A scalar prediction with an uncalibrated confidence proxy in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub value: f64,
    pub confidence: f64,
}

/// One historical post with its feature vector and realized outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: Vec<f64>,
    pub engagement_rate: f64,
    pub followers_gained: f64,
    pub posted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_round_trip() {
        for scope in Scope::ALL {
            assert_eq!(scope.as_str().parse::<Scope>().unwrap(), scope);
        }
        assert!("broadcast".parse::<Scope>().is_err());
    }

    #[test]
    fn test_scope_algorithm() {
        assert_eq!(
            Scope::Content.algorithm(),
            SelectionAlgorithm::ThompsonSampling
        );
        assert_eq!(Scope::Reply.algorithm(), SelectionAlgorithm::ThompsonSampling);
        assert_eq!(Scope::Timing.algorithm(), SelectionAlgorithm::Ucb1);
    }

    #[test]
    fn test_metadata_accepts_partial_records() {
        let meta: ContentMetadata =
            serde_json::from_str(r#"{"hook_type":"bold_claim","hour_posted":9}"#).unwrap();
        assert_eq!(meta.hook_type.as_deref(), Some("bold_claim"));
        assert_eq!(meta.hour_posted, Some(9));
        assert!(meta.topic.is_none());
        assert!(meta.quality_score.is_none());
    }
}
