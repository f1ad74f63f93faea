//! Deterministic text + metadata → feature record extraction.
//!
//! Extraction is total: any input, including empty or malformed text,
//! produces a fully populated record. Every ratio is zero-guarded.

use chrono::{DateTime, Datelike, Timelike, Utc};
use pulse_core::types::ContentMetadata;
use tracing::trace;

use crate::features::ContentFeatures;
use crate::text;
use crate::vocab;

/// Only the opening of a post counts as a question hook.
const HOOK_WINDOW_CHARS: usize = 120;

/// Claim density is reported per this many characters.
const CLAIM_DENSITY_UNIT: f64 = 280.0;

/// Morning, lunch and evening windows.
const PRIME_TIME_HOURS: &[u32] = &[7, 8, 9, 12, 17, 18, 19, 20, 21];

/// Extract features, taking timing from metadata or the current wall clock.
pub fn extract(text: &str, metadata: &ContentMetadata) -> ContentFeatures {
    extract_at(text, metadata, Utc::now())
}

/// Extract features with an explicit capture time for timing fallbacks.
pub fn extract_at(text: &str, metadata: &ContentMetadata, now: DateTime<Utc>) -> ContentFeatures {
    let words = text::words(text);
    let char_count = text.chars().count() as u32;
    let word_count = words.len() as u32;
    let sentence_count = text::sentence_count(text);
    let syllable_count: u32 = words.iter().map(|w| text::syllables(w)).sum();
    let letter_count: usize = words
        .iter()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).count())
        .sum();
    let emoji_count = text::emoji_count(text);

    let opening: String = text.chars().take(HOOK_WINDOW_CHARS).collect();
    let claim_hits = vocab::CLAIM.find_iter(text).count() as f64;

    let hour_of_day = metadata
        .hour_posted
        .filter(|h| *h < 24)
        .unwrap_or_else(|| now.hour());
    let day_of_week = metadata
        .day_of_week
        .filter(|d| *d < 7)
        .unwrap_or_else(|| now.weekday().num_days_from_sunday());

    let thread_length = metadata.thread_length.unwrap_or(1);

    let features = ContentFeatures {
        char_count,
        word_count,
        sentence_count,
        avg_word_length: text::ratio(letter_count as f64, f64::from(word_count)),
        avg_sentence_length: text::ratio(f64::from(word_count), f64::from(sentence_count)),
        readability_grade: text::flesch_kincaid_grade(word_count, sentence_count, syllable_count),
        emoji_count,
        emoji_ratio: text::ratio(f64::from(emoji_count), f64::from(char_count)),
        hashtag_count: vocab::HASHTAG.find_iter(text).count() as u32,
        has_question_hook: opening.contains('?'),
        has_numbers: text.chars().any(|c| c.is_ascii_digit()),
        has_second_person: vocab::SECOND_PERSON.is_match(text),
        has_list_markers: vocab::LIST_MARKER.is_match(text),
        has_time_reference: vocab::TIME_REFERENCE.is_match(text),
        has_action_verbs: vocab::ACTION_VERB.is_match(text),
        has_controversy: vocab::CONTROVERSY.is_match(text),
        has_urgency: vocab::URGENCY.is_match(text),
        has_citation: vocab::CITATION.is_match(text),
        has_statistic: vocab::STATISTIC.is_match(text),
        has_expert_language: vocab::EXPERT.is_match(text),
        claim_density: text::ratio(claim_hits * CLAIM_DENSITY_UNIT, f64::from(char_count)),
        hour_of_day,
        day_of_week,
        is_weekend: day_of_week == 0 || day_of_week == 6,
        is_prime_time: PRIME_TIME_HOURS.contains(&hour_of_day),
        thread_length,
        is_thread: thread_length > 1,
        hook_type_code: vocab::label_code(vocab::HOOK_TYPES, metadata.hook_type.as_deref()),
        cta_type_code: vocab::label_code(vocab::CTA_TYPES, metadata.cta_type.as_deref()),
        style_code: vocab::label_code(vocab::STYLES, metadata.style.as_deref()),
        topic_code: vocab::label_code(vocab::TOPICS, metadata.topic.as_deref()),
        has_fact_source: metadata
            .fact_source
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty()),
        quality_score: metadata
            .quality_score
            .filter(|q| q.is_finite())
            .unwrap_or(0.0),
    };

    trace!(
        chars = char_count,
        words = word_count,
        grade = features.readability_grade,
        "features extracted"
    );
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{feature_names, features_to_array};
    use chrono::TimeZone;

    fn saturday_morning() -> DateTime<Utc> {
        // 2024-03-16 was a Saturday.
        Utc.with_ymd_and_hms(2024, 3, 16, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_empty_text_is_all_zero_ratios() {
        let f = extract_at("", &ContentMetadata::default(), saturday_morning());
        assert_eq!(f.char_count, 0);
        assert_eq!(f.word_count, 0);
        assert_eq!(f.sentence_count, 0);
        assert_eq!(f.avg_word_length, 0.0);
        assert_eq!(f.avg_sentence_length, 0.0);
        assert_eq!(f.readability_grade, 0.0);
        assert_eq!(f.emoji_ratio, 0.0);
        assert_eq!(f.claim_density, 0.0);
        assert!(features_to_array(&f).iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_vector_length_matches_names_for_arbitrary_text() {
        let samples = [
            "",
            " ",
            "?",
            "😴😴😴",
            "Did you know 1 in 3 adults sleep less than 7 hours? A 2023 study says you should fix it now.",
            "\n\n\n- a\n- b\n- c",
            "ÄÖÜ ß 中文 العربية",
        ];
        for text in samples {
            let f = extract_at(text, &ContentMetadata::default(), saturday_morning());
            assert_eq!(features_to_array(&f).len(), feature_names().len());
        }
    }

    #[test]
    fn test_engagement_signals() {
        let text = "Are you sleeping enough? 😴\n\n\
                    1. Stop caffeine after 2pm\n\
                    2. Get 10 minutes of morning light\n\n\
                    A 2022 study found 35% better sleep. Doctors always recommend it. #sleep";
        let f = extract_at(text, &ContentMetadata::default(), saturday_morning());
        assert!(f.has_question_hook);
        assert!(f.has_numbers);
        assert!(f.has_second_person);
        assert!(f.has_list_markers);
        assert!(f.has_time_reference);
        assert!(f.has_action_verbs);
        assert!(f.has_citation);
        assert!(f.has_statistic);
        assert!(f.has_expert_language);
        assert_eq!(f.emoji_count, 1);
        assert_eq!(f.hashtag_count, 1);
        assert!(f.claim_density > 0.0);
        assert!(f.readability_grade >= 0.0);
    }

    #[test]
    fn test_question_outside_hook_window() {
        let text = format!("{} why?", "a ".repeat(100));
        let f = extract_at(&text, &ContentMetadata::default(), saturday_morning());
        assert!(!f.has_question_hook);
    }

    #[test]
    fn test_claim_density_per_280_chars() {
        let text = "You must sleep.";
        let f = extract_at(text, &ContentMetadata::default(), saturday_morning());
        let expected = 280.0 / text.chars().count() as f64;
        assert!((f.claim_density - expected).abs() < 1e-9);
    }

    #[test]
    fn test_timing_from_wall_clock() {
        let f = extract_at("hello", &ContentMetadata::default(), saturday_morning());
        assert_eq!(f.hour_of_day, 8);
        assert_eq!(f.day_of_week, 6);
        assert!(f.is_weekend);
        assert!(f.is_prime_time);
    }

    #[test]
    fn test_timing_from_metadata_overrides_clock() {
        let meta = ContentMetadata {
            hour_posted: Some(3),
            day_of_week: Some(2),
            ..Default::default()
        };
        let f = extract_at("hello", &meta, saturday_morning());
        assert_eq!(f.hour_of_day, 3);
        assert_eq!(f.day_of_week, 2);
        assert!(!f.is_weekend);
        assert!(!f.is_prime_time);
    }

    #[test]
    fn test_out_of_range_metadata_timing_falls_back() {
        let meta = ContentMetadata {
            hour_posted: Some(31),
            day_of_week: Some(9),
            ..Default::default()
        };
        let f = extract_at("hello", &meta, saturday_morning());
        assert_eq!(f.hour_of_day, 8);
        assert_eq!(f.day_of_week, 6);
    }

    #[test]
    fn test_metadata_pass_through() {
        let meta = ContentMetadata {
            style: Some("educational".into()),
            fact_source: Some("NIH".into()),
            topic: Some("sleep".into()),
            thread_length: Some(4),
            hook_type: Some("bold_claim".into()),
            cta_type: Some("follow".into()),
            quality_score: Some(0.72),
            ..Default::default()
        };
        let f = extract_at("Sleep is a skill.", &meta, saturday_morning());
        assert_eq!(f.thread_length, 4);
        assert!(f.is_thread);
        assert_eq!(f.hook_type_code, 2);
        assert_eq!(f.cta_type_code, 1);
        assert_eq!(f.style_code, 1);
        assert_eq!(f.topic_code, 1);
        assert!(f.has_fact_source);
        assert!((f.quality_score - 0.72).abs() < 1e-12);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let meta = ContentMetadata {
            hour_posted: Some(12),
            day_of_week: Some(3),
            ..Default::default()
        };
        let text = "Protein at breakfast keeps you full. Try 30g.";
        assert_eq!(extract(text, &meta), extract(text, &meta));
    }
}
