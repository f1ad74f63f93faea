//! Canonical feature layout shared by extraction and model application.
//!
//! The struct, the name list and the vector conversion are emitted by one
//! macro invocation so their order cannot diverge.

use serde::{Deserialize, Serialize};

/// Bumped whenever the layout below changes. Models record the version they
/// were trained against.
pub const FEATURE_VERSION: u32 = 1;

trait FeatureValue {
    fn as_f64(&self) -> f64;
}

impl FeatureValue for f64 {
    fn as_f64(&self) -> f64 {
        if self.is_finite() {
            *self
        } else {
            0.0
        }
    }
}

impl FeatureValue for u32 {
    fn as_f64(&self) -> f64 {
        f64::from(*self)
    }
}

impl FeatureValue for bool {
    fn as_f64(&self) -> f64 {
        if *self {
            1.0
        } else {
            0.0
        }
    }
}

macro_rules! feature_layout {
    ($($(#[$doc:meta])* $field:ident: $ty:ty),+ $(,)?) => {
        /// Flat, versioned record of numeric and boolean content features.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct ContentFeatures {
            $($(#[$doc])* pub $field: $ty,)+
        }

        /// Feature names in vector order.
        pub const FEATURE_NAMES: &[&str] = &[$(stringify!($field)),+];

        impl ContentFeatures {
            /// Numeric vector in `FEATURE_NAMES` order.
            pub fn to_array(&self) -> Vec<f64> {
                vec![$(FeatureValue::as_f64(&self.$field)),+]
            }
        }
    };
}

feature_layout! {
    char_count: u32,
    word_count: u32,
    sentence_count: u32,
    avg_word_length: f64,
    avg_sentence_length: f64,
    /// Flesch-Kincaid grade level, floored at 0.
    readability_grade: f64,
    emoji_count: u32,
    emoji_ratio: f64,
    hashtag_count: u32,
    /// A question mark within the first 120 characters.
    has_question_hook: bool,
    has_numbers: bool,
    has_second_person: bool,
    has_list_markers: bool,
    has_time_reference: bool,
    has_action_verbs: bool,
    has_controversy: bool,
    has_urgency: bool,
    has_citation: bool,
    has_statistic: bool,
    has_expert_language: bool,
    /// Assertive or prescriptive phrases per 280 characters.
    claim_density: f64,
    hour_of_day: u32,
    /// 0 = Sunday.
    day_of_week: u32,
    is_weekend: bool,
    is_prime_time: bool,
    thread_length: u32,
    is_thread: bool,
    /// 1-based index into the hook vocabulary, 0 when unknown.
    hook_type_code: u32,
    cta_type_code: u32,
    style_code: u32,
    topic_code: u32,
    has_fact_source: bool,
    quality_score: f64,
}

/// Number of features in the canonical layout.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Map a feature record to its numeric vector.
pub fn features_to_array(features: &ContentFeatures) -> Vec<f64> {
    features.to_array()
}

/// Feature names, in the same order `features_to_array` emits values.
pub fn feature_names() -> &'static [&'static str] {
    FEATURE_NAMES
}

/// Position of a named feature in the vector.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vector_matches_names() {
        let v = features_to_array(&ContentFeatures::default());
        assert_eq!(v.len(), feature_names().len());
        assert_eq!(v.len(), FEATURE_COUNT);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = FEATURE_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_values_land_at_named_positions() {
        let features = ContentFeatures {
            word_count: 12,
            has_citation: true,
            claim_density: 2.5,
            quality_score: 0.8,
            ..Default::default()
        };
        let v = features.to_array();
        assert_eq!(v[feature_index("word_count").unwrap()], 12.0);
        assert_eq!(v[feature_index("has_citation").unwrap()], 1.0);
        assert_eq!(v[feature_index("claim_density").unwrap()], 2.5);
        assert_eq!(v[feature_index("quality_score").unwrap()], 0.8);
        assert!(feature_index("no_such_feature").is_none());
    }

    #[test]
    fn test_non_finite_values_flatten_to_zero() {
        let features = ContentFeatures {
            quality_score: f64::NAN,
            emoji_ratio: f64::INFINITY,
            ..Default::default()
        };
        assert!(features.to_array().iter().all(|x| x.is_finite()));
    }
}
