//! Streak and peak tracking over confirmed events
//!
//! Keeps the single running streak, archives Happy streaks of three or more
//! events once a different label takes over, and records high-confidence
//! Angry events as peak moments.

use crate::types::{EmotionEvent, EmotionLabel, HappinessStreak, PeakMoment, Streak};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shortest Happy streak worth archiving
pub const MIN_HAPPINESS_STREAK: u32 = 3;

/// Angry confidence must be strictly above this to count as a peak
pub const PEAK_RAGE_CONFIDENCE: u8 = 70;

/// Streak and peak state for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakTracker {
    current: Option<Streak>,
    happiness_streaks: Vec<HappinessStreak>,
    peak_moments: Vec<PeakMoment>,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one confirmed event into the streak and peak records
    pub fn record(&mut self, event: &EmotionEvent) {
        let now = event.timestamp_seconds;

        match self.current.take() {
            Some(mut streak) if streak.emotion == event.label => {
                streak.length = streak.length.saturating_add(1);
                self.current = Some(streak);
            }
            outgoing => {
                if let Some(outgoing) = outgoing {
                    self.archive(outgoing, now);
                }
                self.current = Some(Streak {
                    emotion: event.label,
                    length: 1,
                    start_time: now,
                });
            }
        }

        if event.label == EmotionLabel::Angry && event.confidence > PEAK_RAGE_CONFIDENCE {
            self.peak_moments.push(PeakMoment {
                timestamp_seconds: now,
                confidence: event.confidence,
            });
        }
    }

    fn archive(&mut self, outgoing: Streak, now: f64) {
        if outgoing.emotion != EmotionLabel::Happy || outgoing.length < MIN_HAPPINESS_STREAK {
            return;
        }
        let streak = HappinessStreak {
            length: outgoing.length,
            duration_seconds: (now - outgoing.start_time).max(0.0),
        };
        debug!(
            length = streak.length,
            duration_seconds = streak.duration_seconds,
            "archived happiness streak"
        );
        self.happiness_streaks.push(streak);
    }

    /// The running streak, if any event has been confirmed yet
    pub fn current(&self) -> Option<&Streak> {
        self.current.as_ref()
    }

    pub fn happiness_streaks(&self) -> &[HappinessStreak] {
        &self.happiness_streaks
    }

    pub fn peak_moments(&self) -> &[PeakMoment] {
        &self.peak_moments
    }

    /// Drop the running streak and every archived record
    pub fn clear(&mut self) {
        self.current = None;
        self.happiness_streaks.clear();
        self.peak_moments.clear();
    }
}
