//! Core types for the Rage Tracker engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: per-frame feature samples, classifications, confirmed events, streak
//! records, and the session summary handed to storage and reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete emotion label produced by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Happy,
    Angry,
    Neutral,
}

impl EmotionLabel {
    /// All labels in reporting order
    pub const ALL: [EmotionLabel; 3] = [
        EmotionLabel::Happy,
        EmotionLabel::Angry,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-frame facial measurements supplied by the external feature extractor.
///
/// Only constructed when a face is present in the frame. The extractor reduces
/// multi-face frames to the first detected face before building a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSample {
    /// Number of smile detections inside the face region
    pub smile_hit_count: u32,
    /// Number of eye detections inside the face region
    pub eye_hit_count: u32,
    /// Mean intensity of the brow band (top of the face)
    pub brow_mean: f64,
    /// Intensity variance of the brow band
    pub brow_variance: f64,
    /// Mean intensity of the mouth band (bottom of the face)
    pub mouth_mean: f64,
    /// Mean intensity of the eye band
    pub eye_region_mean: f64,
}

impl FeatureSample {
    /// Whether every intensity statistic is a finite number
    pub fn is_finite(&self) -> bool {
        self.non_finite_field().is_none()
    }

    /// Name of the first intensity statistic that is NaN or infinite
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("brow_mean", self.brow_mean),
            ("brow_variance", self.brow_variance),
            ("mouth_mean", self.mouth_mean),
            ("eye_region_mean", self.eye_region_mean),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(field, _)| field)
    }
}

/// Label and confidence (0-100) for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: EmotionLabel,
    pub confidence: u8,
}

impl ClassificationResult {
    pub fn new(label: EmotionLabel, confidence: u8) -> Self {
        Self {
            label,
            confidence: confidence.min(100),
        }
    }

    /// Classification used for frames without a detected face
    pub fn no_face() -> Self {
        Self::new(EmotionLabel::Neutral, 0)
    }
}

/// A confirmed emotion event (one counter increment)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionEvent {
    /// Seconds since session start
    pub timestamp_seconds: f64,
    pub label: EmotionLabel,
    pub confidence: u8,
}

/// Per-label confirmed event counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCounts {
    pub happy: u32,
    pub angry: u32,
    pub neutral: u32,
}

impl EmotionCounts {
    pub fn get(&self, label: EmotionLabel) -> u32 {
        match label {
            EmotionLabel::Happy => self.happy,
            EmotionLabel::Angry => self.angry,
            EmotionLabel::Neutral => self.neutral,
        }
    }

    pub fn increment(&mut self, label: EmotionLabel) {
        let slot = match label {
            EmotionLabel::Happy => &mut self.happy,
            EmotionLabel::Angry => &mut self.angry,
            EmotionLabel::Neutral => &mut self.neutral,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.happy
            .saturating_add(self.angry)
            .saturating_add(self.neutral)
    }

    /// Share of `label` in the total, as a percentage rounded to 2 decimals.
    ///
    /// Returns 0 when no events have been counted.
    pub fn percentage(&self, label: EmotionLabel) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        round2(self.get(label) as f64 / total as f64 * 100.0)
    }
}

/// The running streak of consecutively confirmed events with one label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    pub emotion: EmotionLabel,
    pub length: u32,
    /// Seconds since session start when the streak began
    pub start_time: f64,
}

/// An archived Happy streak of at least three events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HappinessStreak {
    pub length: u32,
    pub duration_seconds: f64,
}

/// A high-confidence confirmed Angry event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakMoment {
    pub timestamp_seconds: f64,
    pub confidence: u8,
}

/// Result of feeding one frame through the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    /// Classification that was fed to the debouncer
    pub classification: ClassificationResult,
    /// Event confirmed on this frame, if any
    pub confirmed: Option<EmotionEvent>,
}

/// Coarse rage rating of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RageLevel {
    Calm,
    Moderate,
    High,
}

impl RageLevel {
    /// Rate a session by its angry percentage
    pub fn from_angry_percentage(angry_percentage: f64) -> Self {
        if angry_percentage > 50.0 {
            RageLevel::High
        } else if angry_percentage > 30.0 {
            RageLevel::Moderate
        } else {
            RageLevel::Calm
        }
    }
}

/// Flat per-session record consumed by storage and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub game: String,
    /// Session start, `%Y-%m-%d %H:%M:%S` (UTC)
    pub date: String,
    pub duration_seconds: u64,
    pub happy_count: u32,
    pub angry_count: u32,
    pub neutral_count: u32,
    pub happy_percentage: f64,
    pub angry_percentage: f64,
    pub neutral_percentage: f64,
    pub peak_rage_count: u32,
    pub happiness_streaks: u32,
    pub emotional_trend: EmotionLabel,
    pub total_frames: u64,
}

impl SessionSummary {
    pub fn rage_level(&self) -> RageLevel {
        RageLevel::from_angry_percentage(self.angry_percentage)
    }
}

// ============================================================================
// Report Output Types
// ============================================================================

/// Producer metadata stamped on every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Session summary wrapped with provenance for the reporting surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub rage_level: RageLevel,
    pub session: SessionSummary,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
