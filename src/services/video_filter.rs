//! Video filtering against configured criteria
//!
//! Cheap rejection happens before any parsing or dedup work. Checks run
//! in a fixed order and short-circuit: upload recency, duration bounds,
//! exclude keywords, then fuzzy title patterns. The first failing check
//! names the rejection reason.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::{FiltersConfig, TitlePattern};
use crate::media::VideoRecord;

/// Why a record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TooOld,
    TooShort,
    TooLong,
    ExcludedKeyword,
    BelowFuzzyThreshold,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::TooOld => "too-old",
            RejectReason::TooShort => "too-short",
            RejectReason::TooLong => "too-long",
            RejectReason::ExcludedKeyword => "excluded-keyword",
            RejectReason::BelowFuzzyThreshold => "below-fuzzy-threshold",
        }
    }
}

/// Verdict for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Accept,
    Reject(RejectReason),
}

/// Evaluates records against the configured filter criteria.
///
/// The recency cutoff is fixed at construction, one engine per run, so
/// [FilterEngine::evaluate] is a pure function of the record.
#[derive(Debug)]
pub struct FilterEngine {
    cutoff: Option<DateTime<Utc>>,
    min_duration_seconds: Option<u32>,
    max_duration_seconds: Option<u32>,
    exclude_keywords: Vec<String>,
    title_patterns: Vec<TitlePattern>,
}

impl FilterEngine {
    pub fn new(config: &FiltersConfig, run_start: DateTime<Utc>) -> Self {
        let cutoff = (config.upload_window_days > 0)
            .then(|| run_start - Duration::days(i64::from(config.upload_window_days)));

        Self {
            cutoff,
            min_duration_seconds: (config.min_duration_minutes > 0)
                .then_some(config.min_duration_minutes.saturating_mul(60)),
            max_duration_seconds: (config.max_duration_minutes > 0)
                .then_some(config.max_duration_minutes.saturating_mul(60)),
            exclude_keywords: config
                .exclude_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            title_patterns: config.title_patterns.clone(),
        }
    }

    pub fn evaluate(&self, record: &VideoRecord) -> FilterVerdict {
        if let Some(cutoff) = self.cutoff
            && record.upload_date < cutoff
        {
            debug!(video_id = %record.id, upload_date = %record.upload_date, "Rejected: too old");
            return FilterVerdict::Reject(RejectReason::TooOld);
        }

        // Duration bounds only reject a known out-of-range duration; a
        // source that carries no duration passes both bounds.
        if let Some(min) = self.min_duration_seconds
            && let Some(seconds) = record.duration_seconds
            && seconds < min
        {
            debug!(video_id = %record.id, seconds = seconds, "Rejected: too short");
            return FilterVerdict::Reject(RejectReason::TooShort);
        }
        if let Some(max) = self.max_duration_seconds
            && let Some(seconds) = record.duration_seconds
            && seconds > max
        {
            debug!(video_id = %record.id, seconds = seconds, "Rejected: too long");
            return FilterVerdict::Reject(RejectReason::TooLong);
        }

        let title_lower = record.title.to_lowercase();
        if let Some(keyword) = self
            .exclude_keywords
            .iter()
            .find(|k| title_lower.contains(k.as_str()))
        {
            debug!(video_id = %record.id, keyword = %keyword, "Rejected: excluded keyword");
            return FilterVerdict::Reject(RejectReason::ExcludedKeyword);
        }

        if !self.title_patterns.is_empty() {
            let matched = self.title_patterns.iter().any(|p| {
                let score = similarity_score(&p.pattern, &record.title);
                let passed = score >= f64::from(p.fuzzy_threshold);
                debug!(
                    video_id = %record.id,
                    pattern = %p.pattern,
                    score = score,
                    threshold = p.fuzzy_threshold,
                    passed = passed,
                    "Fuzzy title check"
                );
                passed
            });
            if !matched {
                return FilterVerdict::Reject(RejectReason::BelowFuzzyThreshold);
            }
        }

        FilterVerdict::Accept
    }
}

/// Similarity between a configured pattern and a title, 0-100.
///
/// An exact case-insensitive substring scores 100 outright; otherwise the
/// best normalized Levenshtein similarity of the pattern against every
/// same-length window of the title, so a short pattern can still score
/// high against a long title.
pub fn similarity_score(pattern: &str, title: &str) -> f64 {
    let pattern = pattern.to_lowercase();
    let title = title.to_lowercase();

    if pattern.is_empty() {
        return 100.0;
    }
    if title.contains(&pattern) {
        return 100.0;
    }

    let pattern_chars: Vec<char> = pattern.chars().collect();
    let title_chars: Vec<char> = title.chars().collect();

    use rapidfuzz::distance::levenshtein;

    if title_chars.len() <= pattern_chars.len() {
        return levenshtein::normalized_similarity(
            pattern_chars.iter().copied(),
            title_chars.iter().copied(),
        ) * 100.0;
    }

    let window = pattern_chars.len();
    let mut best: f64 = 0.0;
    for start in 0..=(title_chars.len() - window) {
        let similarity = levenshtein::normalized_similarity(
            pattern_chars.iter().copied(),
            title_chars[start..start + window].iter().copied(),
        );
        best = best.max(similarity);
    }
    best * 100.0
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    fn record(title: &str, days_ago: i64, duration_seconds: u32) -> VideoRecord {
        VideoRecord {
            id: "vid1".into(),
            title: title.into(),
            channel_name: "Channel".into(),
            upload_date: now() - Duration::days(days_ago),
            duration_seconds: Some(duration_seconds),
            description: String::new(),
        }
    }

    fn record_without_duration(title: &str) -> VideoRecord {
        VideoRecord {
            duration_seconds: None,
            ..record(title, 1, 0)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap()
    }

    fn config() -> FiltersConfig {
        FiltersConfig {
            upload_window_days: 7,
            title_patterns: Vec::new(),
            min_duration_minutes: 0,
            max_duration_minutes: 0,
            exclude_keywords: Vec::new(),
        }
    }

    #[test]
    fn test_accepts_recent_video() {
        let engine = FilterEngine::new(&config(), now());
        assert_eq!(engine.evaluate(&record("Anything", 1, 600)), FilterVerdict::Accept);
    }

    #[test]
    fn test_rejects_old_upload() {
        let engine = FilterEngine::new(&config(), now());
        assert_eq!(
            engine.evaluate(&record("Old", 8, 600)),
            FilterVerdict::Reject(RejectReason::TooOld)
        );
    }

    #[test]
    fn test_zero_window_disables_recency() {
        let mut cfg = config();
        cfg.upload_window_days = 0;
        let engine = FilterEngine::new(&cfg, now());
        assert_eq!(engine.evaluate(&record("Ancient", 3650, 600)), FilterVerdict::Accept);
    }

    #[test]
    fn test_rejects_too_short() {
        let mut cfg = config();
        cfg.min_duration_minutes = 10;
        let engine = FilterEngine::new(&cfg, now());
        assert_eq!(
            engine.evaluate(&record("Short clip", 1, 30)),
            FilterVerdict::Reject(RejectReason::TooShort)
        );
    }

    #[test]
    fn test_rejects_too_long() {
        let mut cfg = config();
        cfg.max_duration_minutes = 60;
        let engine = FilterEngine::new(&cfg, now());
        assert_eq!(
            engine.evaluate(&record("Marathon stream", 1, 4 * 3600)),
            FilterVerdict::Reject(RejectReason::TooLong)
        );
    }

    #[test]
    fn test_unknown_duration_passes_duration_bounds() {
        // RSS-sourced records carry no duration; configured bounds must
        // not reject them.
        let mut cfg = config();
        cfg.min_duration_minutes = 10;
        cfg.max_duration_minutes = 90;
        let engine = FilterEngine::new(&cfg, now());
        assert_eq!(
            engine.evaluate(&record_without_duration("Feed entry")),
            FilterVerdict::Accept
        );
    }

    #[test]
    fn test_huge_duration_bound_does_not_wrap() {
        // u32::MAX/60 rounds to 71_582_788; one more minute would wrap
        // the seconds conversion to 44 and let a short video through.
        let mut cfg = config();
        cfg.min_duration_minutes = 71_582_789;
        let engine = FilterEngine::new(&cfg, now());
        assert_eq!(
            engine.evaluate(&record("Short", 1, 600)),
            FilterVerdict::Reject(RejectReason::TooShort)
        );
    }

    #[test]
    fn test_rejects_excluded_keyword_case_insensitive() {
        let mut cfg = config();
        cfg.exclude_keywords = vec!["TRAILER".into()];
        let engine = FilterEngine::new(&cfg, now());
        assert_eq!(
            engine.evaluate(&record("New season trailer", 1, 120)),
            FilterVerdict::Reject(RejectReason::ExcludedKeyword)
        );
    }

    #[test]
    fn test_fuzzy_pattern_substring_passes() {
        let mut cfg = config();
        cfg.title_patterns = vec![TitlePattern {
            pattern: "only connect".into(),
            fuzzy_threshold: 85,
        }];
        let engine = FilterEngine::new(&cfg, now());
        assert_eq!(
            engine.evaluate(&record("Only Connect - Series 21 - Episode 3", 1, 1740)),
            FilterVerdict::Accept
        );
    }

    #[test]
    fn test_fuzzy_pattern_near_miss_passes_threshold() {
        let mut cfg = config();
        cfg.title_patterns = vec![TitlePattern {
            pattern: "onli connect".into(),
            fuzzy_threshold: 85,
        }];
        let engine = FilterEngine::new(&cfg, now());
        assert_eq!(
            engine.evaluate(&record("Only Connect - Series 21 - Episode 3", 1, 1740)),
            FilterVerdict::Accept
        );
    }

    #[test]
    fn test_fuzzy_rejects_unrelated_title() {
        let mut cfg = config();
        cfg.title_patterns = vec![TitlePattern {
            pattern: "university challenge".into(),
            fuzzy_threshold: 85,
        }];
        let engine = FilterEngine::new(&cfg, now());
        assert_matches!(
            engine.evaluate(&record("Cooking with gas", 1, 1740)),
            FilterVerdict::Reject(RejectReason::BelowFuzzyThreshold)
        );
    }

    #[test]
    fn test_any_pattern_passing_accepts() {
        let mut cfg = config();
        cfg.title_patterns = vec![
            TitlePattern { pattern: "taskmaster".into(), fuzzy_threshold: 90 },
            TitlePattern { pattern: "only connect".into(), fuzzy_threshold: 90 },
        ];
        let engine = FilterEngine::new(&cfg, now());
        assert_eq!(
            engine.evaluate(&record("Only Connect - Series 21 - Episode 3", 1, 1740)),
            FilterVerdict::Accept
        );
    }

    #[test]
    fn test_check_order_recency_before_duration() {
        let mut cfg = config();
        cfg.min_duration_minutes = 10;
        let engine = FilterEngine::new(&cfg, now());
        // Both checks would fail; the first one in order names the reason.
        assert_eq!(
            engine.evaluate(&record("Old and short", 30, 30)),
            FilterVerdict::Reject(RejectReason::TooOld)
        );
    }

    #[test]
    fn test_verdict_is_deterministic() {
        let mut cfg = config();
        cfg.title_patterns = vec![TitlePattern {
            pattern: "quiz show".into(),
            fuzzy_threshold: 70,
        }];
        let engine = FilterEngine::new(&cfg, now());
        let r = record("Quiz Show special", 2, 900);
        let first = engine.evaluate(&r);
        for _ in 0..5 {
            assert_eq!(engine.evaluate(&r), first);
        }
    }

    #[test]
    fn test_similarity_score_bounds() {
        assert_eq!(similarity_score("abc", "something abc here"), 100.0);
        assert_eq!(similarity_score("", "anything"), 100.0);
        let score = similarity_score("university chalenge", "University Challenge Series 54");
        assert!(score > 85.0 && score <= 100.0, "score: {score}");
        assert!(similarity_score("zzzzz", "aaaaa") < 20.0);
    }
}
