//! Consecutive-frame confirmation and rate limiting
//!
//! Frame-level classifications are noisy. A label only turns into a counted
//! event once it has held for enough consecutive frames, and even then counts
//! are throttled to one every `frames_between_counts` eligible frames.

use crate::config::{DebounceSettings, EngineConfig, NEUTRAL_CONFIRMATION_MULTIPLIER};
use crate::types::{ClassificationResult, EmotionEvent, EmotionLabel};
use serde::{Deserialize, Serialize};

/// Snapshot of the debouncer's per-frame bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceState {
    pub last_label: EmotionLabel,
    /// Frames in a row with `last_label`, not counting the first one
    pub consecutive_count: u32,
    /// Eligible frames since the last confirmed count
    pub frames_since_last_count: u32,
}

impl Default for DebounceState {
    fn default() -> Self {
        Self {
            last_label: EmotionLabel::Neutral,
            consecutive_count: 0,
            frames_since_last_count: 0,
        }
    }
}

/// Confirmation and throttling state machine
#[derive(Debug, Clone)]
pub struct Debouncer {
    settings: DebounceSettings,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(settings: DebounceSettings) -> Self {
        Self {
            settings,
            state: DebounceState::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.debounce.clone())
    }

    /// Frames `label` must persist before it becomes eligible
    pub fn confirmation_frames(&self, label: EmotionLabel) -> u32 {
        let base = self.settings.emotion_confirmation_frames;
        match label {
            EmotionLabel::Neutral => base.saturating_mul(NEUTRAL_CONFIRMATION_MULTIPLIER),
            EmotionLabel::Happy | EmotionLabel::Angry => base,
        }
    }

    /// Feed one frame. Returns the confirmed event, if this frame produced one.
    pub fn update(
        &mut self,
        result: ClassificationResult,
        timestamp_seconds: f64,
    ) -> Option<EmotionEvent> {
        if result.label == self.state.last_label {
            self.state.consecutive_count = self.state.consecutive_count.saturating_add(1);
        } else {
            // The first frame of a new label does not count toward confirmation
            self.state.consecutive_count = 0;
            self.state.last_label = result.label;
        }

        if self.state.consecutive_count < self.confirmation_frames(self.state.last_label) {
            return None;
        }

        self.state.frames_since_last_count = self.state.frames_since_last_count.saturating_add(1);
        if self.state.frames_since_last_count < self.settings.frames_between_counts {
            return None;
        }

        self.state.frames_since_last_count = 0;
        Some(EmotionEvent {
            timestamp_seconds,
            label: self.state.last_label,
            confidence: result.confidence,
        })
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn settings(&self) -> &DebounceSettings {
        &self.settings
    }

    /// Return to the session-start state
    pub fn reset(&mut self) {
        self.state = DebounceState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer(threshold: u32, between: u32) -> Debouncer {
        Debouncer::new(DebounceSettings {
            emotion_confirmation_frames: threshold,
            frames_between_counts: between,
        })
    }

    fn feed(d: &mut Debouncer, label: EmotionLabel, frames: u32) -> Vec<EmotionEvent> {
        (0..frames)
            .filter_map(|i| d.update(ClassificationResult::new(label, 75), i as f64))
            .collect()
    }

    /// Index (1-based) of the frame that produces the first event
    fn frames_to_first_event(d: &mut Debouncer, label: EmotionLabel) -> u32 {
        for frame in 1..=10_000 {
            if d.update(ClassificationResult::new(label, 75), frame as f64).is_some() {
                return frame;
            }
        }
        panic!("no event within 10000 frames");
    }

    #[test]
    fn test_fires_exactly_at_threshold_plus_between() {
        let mut d = debouncer(8, 15);
        let events = feed(&mut d, EmotionLabel::Happy, 8 + 15 - 1);
        assert!(events.is_empty());

        let event = d.update(ClassificationResult::new(EmotionLabel::Happy, 75), 22.0);
        let event = event.expect("event on frame T + F");
        assert_eq!(event.label, EmotionLabel::Happy);
        assert_eq!(event.confidence, 75);
        assert_eq!(event.timestamp_seconds, 22.0);
        assert_eq!(d.state().frames_since_last_count, 0);
    }

    #[test]
    fn test_constant_stream_cadence() {
        let mut d = debouncer(8, 15);
        // 23 frames to the first event, then one every 15
        let events = feed(&mut d, EmotionLabel::Angry, 23 + 15 * 3);
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_label_change_resets_to_zero() {
        let mut d = debouncer(8, 15);
        feed(&mut d, EmotionLabel::Happy, 5);
        assert_eq!(d.state().consecutive_count, 4);

        d.update(ClassificationResult::new(EmotionLabel::Angry, 80), 5.0);
        let state = d.state();
        assert_eq!(state.last_label, EmotionLabel::Angry);
        assert_eq!(state.consecutive_count, 0);
    }

    #[test]
    fn test_single_frame_blip_never_confirms() {
        let mut d = debouncer(8, 15);
        // Long Happy run, stopped one frame before it would fire again
        let run = 8 + 15 * 4 - 1;
        assert_eq!(feed(&mut d, EmotionLabel::Happy, run).len(), 3);

        let blip = d.update(ClassificationResult::new(EmotionLabel::Angry, 100), 100.0);
        assert!(blip.is_none());

        // Returning to Happy restarts confirmation from zero
        let next = d.update(ClassificationResult::new(EmotionLabel::Happy, 75), 101.0);
        assert!(next.is_none());
        assert_eq!(d.state().consecutive_count, 0);
    }

    #[test]
    fn test_neutral_takes_four_times_longer() {
        // Both streams start with one frame of a different label so their
        // structure is identical.
        let mut happy = debouncer(8, 15);
        happy.update(ClassificationResult::new(EmotionLabel::Angry, 80), 0.0);
        let happy_frames = frames_to_first_event(&mut happy, EmotionLabel::Happy);

        let mut neutral = debouncer(8, 15);
        neutral.update(ClassificationResult::new(EmotionLabel::Angry, 80), 0.0);
        let neutral_frames = frames_to_first_event(&mut neutral, EmotionLabel::Neutral);

        // first frame resets, then T confirmation frames, then F throttled frames
        assert_eq!(happy_frames, 8 + 15);
        assert_eq!(neutral_frames, 4 * 8 + 15);
        assert_eq!(neutral_frames - happy_frames, 3 * 8);
    }

    #[test]
    fn test_throttle_counter_survives_label_change() {
        let mut d = debouncer(2, 10);
        // Happy: frame 1 resets, frames 3.. are eligible
        feed(&mut d, EmotionLabel::Happy, 6);
        assert_eq!(d.state().frames_since_last_count, 4);

        d.update(ClassificationResult::new(EmotionLabel::Angry, 80), 6.0);
        assert_eq!(d.state().frames_since_last_count, 4);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut d = debouncer(2, 3);
        feed(&mut d, EmotionLabel::Happy, 10);
        d.reset();
        assert_eq!(d.state(), DebounceState::default());
    }

    #[test]
    fn test_neutral_needs_four_times_base() {
        let d = debouncer(8, 15);
        assert_eq!(d.confirmation_frames(EmotionLabel::Happy), 8);
        assert_eq!(d.confirmation_frames(EmotionLabel::Angry), 8);
        assert_eq!(d.confirmation_frames(EmotionLabel::Neutral), 32);
    }

    #[test]
    fn test_initial_label_is_neutral() {
        let mut d = debouncer(1, 1);
        // Neutral continues the initial label, so it counts from the first frame
        d.update(ClassificationResult::new(EmotionLabel::Neutral, 0), 0.0);
        assert_eq!(d.state().consecutive_count, 1);
    }
}
