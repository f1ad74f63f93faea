//! Synthetic follower history, post corpus and engagement used by the
//! simulator. A hidden engagement model stands in for real audiences.

use chrono::{DateTime, Duration, Utc};
use pulse_core::{ContentMetadata, EngagementCounters, KernelResult, TrainingSample};
use pulse_features::extract_at;
use pulse_predictor::TrainingDataSource;
use pulse_rewards::FollowerHistory;
use rand::seq::SliceRandom;
use rand::Rng;

pub const SIM_HOOKS: &[&str] = &["question", "bold_claim", "statistic", "story"];
pub const SIM_TOPICS: &[&str] = &["sleep", "nutrition", "exercise", "longevity"];
pub const SIM_FORMATS: &[&str] = &["single", "thread"];

const PRIME_TIME: &[u32] = &[7, 8, 9, 12, 17, 18, 19, 20, 21];

pub struct SyntheticFollowerHistory {
    deltas: Vec<f64>,
}

impl SyntheticFollowerHistory {
    pub fn new(deltas: Vec<f64>) -> Self {
        Self { deltas }
    }

    /// `days` of daily deltas, mostly small with occasional spikes.
    pub fn generate<R: Rng>(rng: &mut R, days: usize) -> Self {
        let deltas = (0..days)
            .map(|_| {
                let base = rng.gen_range(0.0..20.0);
                if rng.gen_bool(0.1) {
                    base + rng.gen_range(20.0..60.0)
                } else {
                    base
                }
            })
            .collect();
        Self { deltas }
    }
}

impl FollowerHistory for SyntheticFollowerHistory {
    fn daily_follower_deltas(&self, _since: DateTime<Utc>) -> KernelResult<Vec<f64>> {
        Ok(self.deltas.clone())
    }
}

pub struct SyntheticTrainingData {
    samples: Vec<TrainingSample>,
}

impl SyntheticTrainingData {
    pub fn new(samples: Vec<TrainingSample>) -> Self {
        Self { samples }
    }

    /// `n` posts spread over the last 29 days, scored by the hidden model.
    pub fn generate<R: Rng>(rng: &mut R, n: usize, now: DateTime<Utc>) -> Self {
        let samples = (0..n)
            .map(|_| {
                let (text, meta) = synthetic_post(rng);
                let rate = true_engagement_rate(&meta) * rng.gen_range(0.8..1.2);
                let followers = (rate * 150.0 + rng.gen_range(-2.0..2.0)).max(0.0).round();
                TrainingSample {
                    features: extract_at(&text, &meta, now).to_array(),
                    engagement_rate: rate,
                    followers_gained: followers,
                    posted_at: now - Duration::hours(rng.gen_range(0..29 * 24)),
                }
            })
            .collect();
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl TrainingDataSource for SyntheticTrainingData {
    fn samples_since(&self, since: DateTime<Utc>) -> KernelResult<Vec<TrainingSample>> {
        Ok(self
            .samples
            .iter()
            .filter(|s| s.posted_at >= since)
            .cloned()
            .collect())
    }
}

/// Ground-truth engagement rate of a post under the simulated audience.
pub fn true_engagement_rate(meta: &ContentMetadata) -> f64 {
    let hook = match meta.hook_type.as_deref() {
        Some("question") => 0.015,
        Some("statistic") => 0.010,
        Some("bold_claim") => 0.008,
        Some("story") => 0.005,
        _ => 0.0,
    };
    let thread = if meta.thread_length.unwrap_or(1) > 1 { 0.005 } else { 0.0 };
    let timing = match meta.hour_posted {
        Some(h) if PRIME_TIME.contains(&h) => 0.006,
        _ => 0.0,
    };
    let topic = if meta.topic.as_deref() == Some("sleep") { 0.004 } else { 0.0 };
    0.02 + hook + thread + timing + topic
}

/// Metadata implied by a `format|hook|topic` content arm id.
pub fn arm_metadata(arm_id: &str) -> ContentMetadata {
    let mut parts = arm_id.split('|');
    let format = parts.next().unwrap_or("single");
    let hook = parts.next().map(str::to_string);
    let topic = parts.next().map(str::to_string);
    ContentMetadata {
        hook_type: hook,
        topic,
        thread_length: Some(if format == "thread" { 4 } else { 1 }),
        ..Default::default()
    }
}

pub fn synthetic_post<R: Rng>(rng: &mut R) -> (String, ContentMetadata) {
    let hook = SIM_HOOKS.choose(rng).copied().unwrap_or("question");
    let topic = SIM_TOPICS.choose(rng).copied().unwrap_or("sleep");
    let text = match hook {
        "question" => format!("Why does your {topic} routine fail? You might be missing one habit."),
        "bold_claim" => format!("Most {topic} advice is wrong. Stop counting and start paying attention."),
        "statistic" => format!("73% of people ignore {topic}. Research shows it costs hours every week."),
        _ => format!("Last year I rebuilt my {topic} habits in 30 days. Here is what happened."),
    };
    let meta = ContentMetadata {
        topic: Some(topic.to_string()),
        hook_type: Some(hook.to_string()),
        thread_length: Some(if rng.gen_bool(0.3) { rng.gen_range(3..7) } else { 1 }),
        quality_score: Some(rng.gen_range(0.5..1.0)),
        hour_posted: Some(rng.gen_range(0..24)),
        day_of_week: Some(rng.gen_range(0..7)),
        ..Default::default()
    };
    (text, meta)
}

/// Counters for a post whose true engagement rate is `rate`.
pub fn engagement_counters<R: Rng>(rng: &mut R, rate: f64) -> EngagementCounters {
    let impressions: u64 = rng.gen_range(500..5000);
    let interactions = impressions as f64 * rate * rng.gen_range(0.7..1.3);
    let likes = (interactions * 1.6).round() as u64;
    let replies = likes / 8;
    EngagementCounters {
        likes,
        reposts: likes / 5,
        replies,
        bookmarks: likes / 10,
        impressions,
        followers_delta_24h: Some((rate * 400.0 + rng.gen_range(-3.0..3.0)).round() as i64),
        interactions_from_nonfollowers: Some(replies / 2),
    }
}
