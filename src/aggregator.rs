//! Session aggregation
//!
//! `SessionAggregator` owns every piece of mutable state for one session and
//! drives the per-frame flow: classify, debounce, and on confirmation update
//! counters, history, streaks, and peaks.

use crate::classifier::Classifier;
use crate::config::{ClassificationPolicy, EngineConfig};
use crate::debounce::{DebounceState, Debouncer};
use crate::error::TrackerError;
use crate::streak::StreakTracker;
use crate::types::{
    ClassificationResult, EmotionCounts, EmotionEvent, EmotionLabel, FeatureSample, FrameOutcome,
    HappinessStreak, PeakMoment, SessionSummary, Streak,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Number of most recent events considered for the trend
pub const TREND_WINDOW: usize = 10;

/// Date format of `SessionSummary::date`
pub const SUMMARY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Below this confidence a binary-policy Neutral is treated as anger
const BINARY_NEUTRAL_FLOOR: u8 = 50;

/// Confidence assigned to a remapped binary-policy Neutral
const BINARY_REMAP_CONFIDENCE: u8 = 60;

/// Stateful engine for one tracking session.
///
/// Feed it one frame at a time with `record_frame` and read the result with
/// `summarize`, which can be called at any point without changing state.
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    game: String,
    config: EngineConfig,
    started_at: DateTime<Utc>,
    classifier: Classifier,
    debouncer: Debouncer,
    counts: EmotionCounts,
    history: Vec<EmotionEvent>,
    streaks: StreakTracker,
    total_frames: u64,
    elapsed_seconds: f64,
}

impl SessionAggregator {
    /// Start a session now with an already validated config
    pub fn new(game: impl Into<String>, config: EngineConfig) -> Self {
        Self::with_start(game, config, Utc::now())
    }

    /// Validate `config` and start a session now
    pub fn try_new(game: impl Into<String>, config: EngineConfig) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self::new(game, config))
    }

    /// Start a session with an explicit start timestamp
    pub fn with_start(
        game: impl Into<String>,
        config: EngineConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        let game = game.into();
        info!(game = %game, policy = ?config.policy, "session started");
        Self {
            classifier: Classifier::from_config(&config),
            debouncer: Debouncer::from_config(&config),
            game,
            config,
            started_at,
            counts: EmotionCounts::default(),
            history: Vec::new(),
            streaks: StreakTracker::new(),
            total_frames: 0,
            elapsed_seconds: 0.0,
        }
    }

    /// Process one frame.
    ///
    /// # Arguments
    /// * `elapsed_seconds` - Caller's clock reading, seconds since session start
    /// * `sample` - Features of the primary face, or `None` when no face was found
    pub fn record_frame(
        &mut self,
        elapsed_seconds: f64,
        sample: Option<FeatureSample>,
    ) -> FrameOutcome {
        self.total_frames = self.total_frames.saturating_add(1);
        let now = if elapsed_seconds.is_finite() {
            elapsed_seconds.max(0.0)
        } else {
            self.elapsed_seconds
        };
        self.elapsed_seconds = self.elapsed_seconds.max(now);

        let classification = match sample {
            Some(sample) => self.remap(self.classifier.classify(&sample)),
            None => ClassificationResult::no_face(),
        };

        let confirmed = self.debouncer.update(classification, now);
        if let Some(event) = confirmed {
            self.apply(event);
        }

        FrameOutcome {
            classification,
            confirmed,
        }
    }

    /// Under the binary policy Neutral is only a high-confidence fallback;
    /// weak Neutral readings are counted as anger.
    fn remap(&self, result: ClassificationResult) -> ClassificationResult {
        if self.config.policy == ClassificationPolicy::Binary
            && result.label == EmotionLabel::Neutral
            && result.confidence < BINARY_NEUTRAL_FLOOR
        {
            ClassificationResult::new(EmotionLabel::Angry, BINARY_REMAP_CONFIDENCE)
        } else {
            result
        }
    }

    fn apply(&mut self, event: EmotionEvent) {
        self.counts.increment(event.label);
        self.history.push(event);
        self.streaks.record(&event);
        debug!(
            label = %event.label,
            confidence = event.confidence,
            timestamp_seconds = event.timestamp_seconds,
            "confirmed emotion event"
        );
    }

    /// Clear counts, history, streaks, and peaks.
    ///
    /// The frame counter, the start timestamp, the elapsed clock, and the
    /// debounce state are kept: a reset restarts the emotional bookkeeping,
    /// not the session timer or the frame-level smoothing.
    pub fn reset(&mut self) {
        self.counts = EmotionCounts::default();
        self.history.clear();
        self.streaks.clear();
        info!(game = %self.game, total_frames = self.total_frames, "session counters reset");
    }

    /// Snapshot the session as a flat summary record
    pub fn summarize(&self) -> SessionSummary {
        let counts = &self.counts;
        SessionSummary {
            game: self.game.clone(),
            date: self.started_at.format(SUMMARY_DATE_FORMAT).to_string(),
            duration_seconds: self.elapsed_seconds as u64,
            happy_count: counts.happy,
            angry_count: counts.angry,
            neutral_count: counts.neutral,
            happy_percentage: counts.percentage(EmotionLabel::Happy),
            angry_percentage: counts.percentage(EmotionLabel::Angry),
            neutral_percentage: counts.percentage(EmotionLabel::Neutral),
            peak_rage_count: self.streaks.peak_moments().len() as u32,
            happiness_streaks: self.streaks.happiness_streaks().len() as u32,
            emotional_trend: emotional_trend(&self.history),
            total_frames: self.total_frames,
        }
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn counts(&self) -> EmotionCounts {
        self.counts
    }

    pub fn history(&self) -> &[EmotionEvent] {
        &self.history
    }

    pub fn peak_moments(&self) -> &[PeakMoment] {
        self.streaks.peak_moments()
    }

    pub fn happiness_streaks(&self) -> &[HappinessStreak] {
        self.streaks.happiness_streaks()
    }

    pub fn current_streak(&self) -> Option<&Streak> {
        self.streaks.current()
    }

    pub fn debounce_state(&self) -> DebounceState {
        self.debouncer.state()
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }
}

/// Most frequent label among the last `TREND_WINDOW` events.
///
/// Ties go to the label whose first occurrence in the window comes earliest.
/// An empty history reads as Neutral.
pub fn emotional_trend(history: &[EmotionEvent]) -> EmotionLabel {
    let window = &history[history.len().saturating_sub(TREND_WINDOW)..];

    let mut best: Option<(EmotionLabel, usize)> = None;
    for event in window {
        let count = window.iter().filter(|e| e.label == event.label).count();
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((event.label, count));
        }
    }

    best.map(|(label, _)| label).unwrap_or(EmotionLabel::Neutral)
}
