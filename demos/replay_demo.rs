//! Replay a synthetic two-minute session and print the session report
//!
//! The first minute smiles, the second scowls, at 30 frames per second.

use rage_tracker::{replay_to_summary, EngineConfig, FeatureSample, FrameRecord, SummaryEncoder};

const FPS: f64 = 30.0;

fn main() {
    let smiling = FeatureSample {
        smile_hit_count: 2,
        eye_hit_count: 2,
        brow_mean: 118.0,
        brow_variance: 80.0,
        mouth_mean: 104.0,
        eye_region_mean: 97.0,
    };
    let scowling = FeatureSample {
        smile_hit_count: 0,
        eye_hit_count: 2,
        brow_mean: 62.0,
        brow_variance: 240.0,
        mouth_mean: 71.0,
        eye_region_mean: 58.0,
    };

    let records: Vec<FrameRecord> = (0..3600u32)
        .map(|frame| {
            let face = match frame {
                0..=1799 => Some(smiling),
                // A few frames where the player looks away
                2400..=2429 => None,
                _ => Some(scowling),
            };
            FrameRecord::new(frame as f64 / FPS, face)
        })
        .collect();

    match replay_to_summary("Demo Game", &records, EngineConfig::default()) {
        Ok(summary) => match SummaryEncoder::new().encode_to_json(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: {e}"),
        },
        Err(e) => eprintln!("Error: {e}"),
    }
}
