//! End-to-end replay of recorded sessions read from disk

use rage_tracker::replay::FrameReplay;
use rage_tracker::{
    replay_to_summary, ConfigProfile, EmotionLabel, EngineConfig, FeatureSample, FrameRecord,
    RageLevel, SummaryEncoder, TrackerError,
};
use std::fs;
use std::io::Write;

fn smiling() -> FeatureSample {
    FeatureSample {
        smile_hit_count: 1,
        eye_hit_count: 2,
        brow_mean: 112.0,
        brow_variance: 120.0,
        mouth_mean: 100.0,
        eye_region_mean: 92.0,
    }
}

fn frowning() -> FeatureSample {
    FeatureSample {
        smile_hit_count: 0,
        ..smiling()
    }
}

/// Write `records` as NDJSON with a blank line in the middle
fn write_ndjson(records: &[FrameRecord]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for (i, record) in records.iter().enumerate() {
        writeln!(file, "{}", serde_json::to_string(record).unwrap()).unwrap();
        if i == records.len() / 2 {
            writeln!(file).unwrap();
        }
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_binary_session_from_disk() {
    // Reactive profile: T = 6, F = 14. Smile for 60 frames, then no smile
    // with a resolved face, which the binary policy reads as anger.
    let records: Vec<FrameRecord> = (1..=100u32)
        .map(|frame| {
            let face = if frame <= 60 { smiling() } else { frowning() };
            FrameRecord::new(frame as f64 / 30.0, Some(face))
        })
        .collect();
    let file = write_ndjson(&records);

    let input = fs::read_to_string(file.path()).unwrap();
    let parsed = FrameReplay::parse_ndjson(&input).unwrap();
    assert_eq!(parsed.len(), records.len());
    assert_eq!(parsed[0].face, Some(smiling()));
    assert_eq!(parsed[99].face, Some(frowning()));

    let config = EngineConfig::from_profile(ConfigProfile::Reactive);
    let summary = replay_to_summary("Street Fighter 6", &parsed, config).unwrap();

    // Happy eligible from frame 7, fires at 20, 34, 48; the throttle sits at
    // 12 after frame 60. Angry eligible from 67, fires at 68, 82, 96.
    assert_eq!(summary.happy_count, 3);
    assert_eq!(summary.angry_count, 3);
    assert_eq!(summary.peak_rage_count, 3);
    assert_eq!(summary.happiness_streaks, 1);
    assert_eq!(summary.emotional_trend, EmotionLabel::Happy);
    assert_eq!(summary.total_frames, 100);
    assert_eq!(summary.duration_seconds, 3);

    let report = SummaryEncoder::new().encode(&summary);
    assert_eq!(report.rage_level, RageLevel::Moderate);
}

#[test]
fn test_graded_session_without_faces_counts_neutral() {
    let records: Vec<FrameRecord> = (0..200u32)
        .map(|frame| FrameRecord::new(frame as f64 / 30.0, None))
        .collect();
    let file = write_ndjson(&records);
    let input = fs::read_to_string(file.path()).unwrap();

    let parsed = FrameReplay::parse_ndjson(&input).unwrap();
    let summary = replay_to_summary("AFK", &parsed, EngineConfig::default()).unwrap();

    // Neutral continues the initial label: eligible from the 32nd frame, first
    // count on the 46th, then every 15th frame
    assert_eq!(summary.neutral_count, 11);
    assert_eq!(summary.neutral_percentage, 100.0);
    assert_eq!(summary.happy_count + summary.angry_count, 0);
    assert_eq!(summary.emotional_trend, EmotionLabel::Neutral);
}

#[test]
fn test_json_array_file_with_backwards_clock_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"elapsed_sec": 0.0}}, {{"elapsed_sec": 0.5}}, {{"elapsed_sec": 0.25}}]"#
    )
    .unwrap();
    file.flush().unwrap();

    let input = fs::read_to_string(file.path()).unwrap();
    let records = FrameReplay::parse_array(&input).unwrap();
    let err = replay_to_summary("Tetris", &records, EngineConfig::default()).unwrap_err();

    assert!(matches!(err, TrackerError::InvalidFrame { index: 2, .. }));
}
