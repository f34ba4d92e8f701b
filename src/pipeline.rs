//! Replay pipeline orchestration
//!
//! One-shot entry points that run a recorded frame stream through a fresh
//! `SessionAggregator`. Live capture loops drive the aggregator directly.

use crate::aggregator::SessionAggregator;
use crate::config::EngineConfig;
use crate::error::TrackerError;
use crate::replay::{FrameRecord, FrameReplay};
use crate::types::SessionSummary;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Replay validated frames into an aggregator that started at `started_at`.
///
/// The aggregator is returned as-is so callers can inspect history, peaks,
/// and streaks as well as the summary.
pub fn replay_session(
    game: &str,
    records: &[FrameRecord],
    config: EngineConfig,
    started_at: DateTime<Utc>,
) -> Result<SessionAggregator, TrackerError> {
    // Stage 1: Reject bad config and bad records before touching any state
    config.validate()?;
    FrameReplay::validate(records)?;

    // Stage 2: Feed every frame in order
    let mut aggregator = SessionAggregator::with_start(game, config, started_at);
    for record in records {
        aggregator.record_frame(record.elapsed_sec, record.face);
    }

    debug!(
        game,
        frames = records.len(),
        events = aggregator.history().len(),
        "replay finished"
    );
    Ok(aggregator)
}

/// Replay frames and summarize (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let summary = replay_to_summary("Tetris", &records, EngineConfig::default())?;
/// ```
pub fn replay_to_summary(
    game: &str,
    records: &[FrameRecord],
    config: EngineConfig,
) -> Result<SessionSummary, TrackerError> {
    Ok(replay_session(game, records, config, Utc::now())?.summarize())
}

/// Replay an NDJSON frame stream and return the summary as JSON.
///
/// # Arguments
/// * `game` - Game label stamped on the summary
/// * `ndjson` - One `FrameRecord` per line
/// * `config_json` - Engine config; `None` uses the Balanced defaults
pub fn ndjson_to_summary_json(
    game: &str,
    ndjson: &str,
    config_json: Option<&str>,
) -> Result<String, TrackerError> {
    let config = match config_json {
        Some(json) => EngineConfig::from_json(json)?,
        None => EngineConfig::default(),
    };
    let records = FrameReplay::parse_ndjson(ndjson)?;
    let summary = replay_to_summary(game, &records, config)?;
    serde_json::to_string(&summary).map_err(|e| TrackerError::EncodingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigProfile;
    use crate::types::{EmotionLabel, FeatureSample};
    use chrono::TimeZone;

    fn smiling() -> FeatureSample {
        FeatureSample {
            smile_hit_count: 3,
            eye_hit_count: 2,
            brow_mean: 115.0,
            brow_variance: 90.0,
            mouth_mean: 105.0,
            eye_region_mean: 95.0,
        }
    }

    fn frames(count: u32, face: Option<FeatureSample>) -> Vec<FrameRecord> {
        (0..count)
            .map(|i| FrameRecord::new(i as f64 / 30.0, face))
            .collect()
    }

    fn ndjson(records: &[FrameRecord]) -> String {
        records
            .iter()
            .map(|r| serde_json::to_string(r).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_replay_to_summary_counts_events() {
        // 23 frames to the first Happy event, then one every 15
        let records = frames(23 + 15 * 2, Some(smiling()));
        let summary = replay_to_summary("Celeste", &records, EngineConfig::default()).unwrap();

        assert_eq!(summary.game, "Celeste");
        assert_eq!(summary.happy_count, 3);
        assert_eq!(summary.happy_percentage, 100.0);
        assert_eq!(summary.emotional_trend, EmotionLabel::Happy);
        assert_eq!(summary.total_frames, 53);
        assert_eq!(summary.duration_seconds, 1);
    }

    #[test]
    fn test_replay_session_uses_given_start() {
        let start = Utc.with_ymd_and_hms(2023, 12, 24, 9, 5, 7).unwrap();
        let agg = replay_session("Celeste", &frames(5, None), EngineConfig::default(), start)
            .unwrap();
        assert_eq!(agg.summarize().date, "2023-12-24 09:05:07");
        assert_eq!(agg.total_frames(), 5);
    }

    #[test]
    fn test_replay_rejects_bad_record_before_processing() {
        let mut records = frames(10, None);
        records[4].elapsed_sec = -1.0;

        let err = replay_to_summary("Celeste", &records, EngineConfig::default()).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidFrame { index: 4, .. }));
    }

    #[test]
    fn test_replay_rejects_bad_config() {
        let mut config = EngineConfig::default();
        config.debounce.emotion_confirmation_frames = 0;
        let err = replay_to_summary("Celeste", &frames(3, None), config).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidConfig(_)));
    }

    #[test]
    fn test_ndjson_to_summary_json_default_config() {
        let input = ndjson(&frames(23, Some(smiling())));
        let json = ndjson_to_summary_json("Hades", &input, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["game"], "Hades");
        assert_eq!(value["happy_count"], 1);
        assert_eq!(value["total_frames"], 23);
    }

    #[test]
    fn test_ndjson_to_summary_json_with_profile_config() {
        // Reactive: 6 confirmation frames, 14 between counts
        let config = EngineConfig::from_profile(ConfigProfile::Reactive)
            .to_json()
            .unwrap();
        let input = ndjson(&frames(20, Some(smiling())));
        let json = ndjson_to_summary_json("Hades", &input, Some(&config)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["happy_count"], 1);
    }

    #[test]
    fn test_ndjson_to_summary_json_parse_error() {
        let err = ndjson_to_summary_json("Hades", "not json", None).unwrap_err();
        assert!(matches!(err, TrackerError::ParseError(_)));
    }
}
