//! Engine configuration
//!
//! Thresholds, debounce timing, and the classification policy, plus the
//! detector hints handed through to the external feature extractor. Configs
//! are loaded from JSON (missing fields fall back to the Balanced profile) and
//! validated before an engine is built from them.

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Neutral needs this many times the base confirmation frames
pub const NEUTRAL_CONFIRMATION_MULTIPLIER: u32 = 4;

/// Allowed range for `frames_between_counts` when nudged by speed adjustment
pub const FRAMES_BETWEEN_COUNTS_RANGE: (u32, u32) = (5, 30);

/// Which decision procedure the classifier applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationPolicy {
    /// Multi-signal anger scoring; Neutral when the evidence is weak
    #[default]
    Graded,
    /// Smile present => Happy, otherwise Angry unless the face is poorly resolved
    Binary,
}

/// Named presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigProfile {
    /// Graded policy, 8 confirmation frames, count every 15 frames
    Balanced,
    /// Binary policy, 6 confirmation frames, count every 14 frames
    Reactive,
    /// Graded policy, 12 confirmation frames, count every 20 frames
    Conservative,
}

impl FromStr for ConfigProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "balanced" => Ok(Self::Balanced),
            "reactive" => Ok(Self::Reactive),
            "conservative" => Ok(Self::Conservative),
            _ => Err(format!("Unknown profile: {}", s)),
        }
    }
}

/// Intensity cut-points and the anger score threshold used by the graded policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    pub anger_score_threshold: u32,
    pub brow_angry_threshold: f64,
    pub brow_very_angry_threshold: f64,
    pub mouth_tense_threshold: f64,
    pub brow_variance_threshold: f64,
    pub eye_region_threshold: f64,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            anger_score_threshold: 40,
            brow_angry_threshold: 75.0,
            brow_very_angry_threshold: 65.0,
            mouth_tense_threshold: 82.0,
            brow_variance_threshold: 200.0,
            eye_region_threshold: 70.0,
        }
    }
}

impl DetectionThresholds {
    /// Raise the brow and mouth cut-points so anger is flagged more readily
    pub fn increase_rage_sensitivity(&mut self) {
        self.brow_angry_threshold += 5.0;
        self.brow_very_angry_threshold += 5.0;
        self.mouth_tense_threshold += 3.0;
    }

    /// Lower the brow and mouth cut-points so anger needs stronger evidence
    pub fn decrease_rage_sensitivity(&mut self) {
        self.brow_angry_threshold = (self.brow_angry_threshold - 5.0).max(0.0);
        self.brow_very_angry_threshold = (self.brow_very_angry_threshold - 5.0).max(0.0);
        self.mouth_tense_threshold = (self.mouth_tense_threshold - 3.0).max(0.0);
    }
}

/// Consecutive-frame confirmation and rate limiting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceSettings {
    /// Frames a Happy/Angry label must persist before it can be counted
    pub emotion_confirmation_frames: u32,
    /// Minimum eligible frames between two confirmed counts
    pub frames_between_counts: u32,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            emotion_confirmation_frames: 8,
            frames_between_counts: 15,
        }
    }
}

/// Cascade parameters passed through to the external feature extractor.
///
/// The classifier never reads these; they only shape how the extractor reports
/// smile and eye hit counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorHints {
    pub smile_scale_factor: f64,
    pub smile_min_neighbors: u32,
    pub smile_min_size: [u32; 2],
    pub eye_scale_factor: f64,
    pub eye_min_neighbors: u32,
    pub eye_min_size: [u32; 2],
}

impl Default for ExtractorHints {
    fn default() -> Self {
        Self {
            smile_scale_factor: 1.7,
            smile_min_neighbors: 18,
            smile_min_size: [25, 25],
            eye_scale_factor: 1.1,
            eye_min_neighbors: 8,
            eye_min_size: [15, 15],
        }
    }
}

impl ExtractorHints {
    /// Make the smile detector less strict
    pub fn increase_happy_sensitivity(&mut self) {
        self.smile_min_neighbors = self.smile_min_neighbors.saturating_sub(2).max(10);
        self.smile_scale_factor = round1(self.smile_scale_factor - 0.1).max(1.5);
    }

    /// Make the smile detector stricter
    pub fn decrease_happy_sensitivity(&mut self) {
        self.smile_min_neighbors = self.smile_min_neighbors.saturating_add(2).min(25);
        self.smile_scale_factor = round1(self.smile_scale_factor + 0.1).min(2.0);
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub policy: ClassificationPolicy,
    pub detection: DetectionThresholds,
    pub debounce: DebounceSettings,
    pub extractor: ExtractorHints,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_profile(ConfigProfile::Balanced)
    }
}

impl EngineConfig {
    /// Build the preset for a named profile
    pub fn from_profile(profile: ConfigProfile) -> Self {
        match profile {
            ConfigProfile::Balanced => Self {
                policy: ClassificationPolicy::Graded,
                detection: DetectionThresholds::default(),
                debounce: DebounceSettings::default(),
                extractor: ExtractorHints::default(),
            },
            ConfigProfile::Reactive => Self {
                policy: ClassificationPolicy::Binary,
                detection: DetectionThresholds {
                    brow_angry_threshold: 90.0,
                    brow_very_angry_threshold: 78.0,
                    mouth_tense_threshold: 88.0,
                    ..DetectionThresholds::default()
                },
                debounce: DebounceSettings {
                    emotion_confirmation_frames: 6,
                    frames_between_counts: 14,
                },
                extractor: ExtractorHints {
                    smile_scale_factor: 1.9,
                    smile_min_neighbors: 22,
                    smile_min_size: [30, 30],
                    ..ExtractorHints::default()
                },
            },
            ConfigProfile::Conservative => Self {
                policy: ClassificationPolicy::Graded,
                detection: DetectionThresholds::default(),
                debounce: DebounceSettings {
                    emotion_confirmation_frames: 12,
                    frames_between_counts: 20,
                },
                extractor: ExtractorHints::default(),
            },
        }
    }

    /// Set the counting speed, rejecting values outside the supported range
    pub fn set_frames_between_counts(&mut self, frames: u32) -> Result<(), TrackerError> {
        let (min, max) = FRAMES_BETWEEN_COUNTS_RANGE;
        if !(min..=max).contains(&frames) {
            return Err(TrackerError::InvalidConfig(format!(
                "frames_between_counts must be between {} and {}, got {}",
                min, max, frames
            )));
        }
        self.debounce.frames_between_counts = frames;
        Ok(())
    }

    /// Check every field is within a sane range
    pub fn validate(&self) -> Result<(), TrackerError> {
        let debounce = &self.debounce;
        if debounce.emotion_confirmation_frames == 0 {
            return Err(invalid("debounce.emotion_confirmation_frames must be at least 1"));
        }
        if debounce.frames_between_counts == 0 {
            return Err(invalid("debounce.frames_between_counts must be at least 1"));
        }

        let detection = &self.detection;
        if detection.anger_score_threshold > 100 {
            return Err(invalid("detection.anger_score_threshold must not exceed 100"));
        }
        let intensities = [
            ("detection.brow_angry_threshold", detection.brow_angry_threshold),
            ("detection.brow_very_angry_threshold", detection.brow_very_angry_threshold),
            ("detection.mouth_tense_threshold", detection.mouth_tense_threshold),
            ("detection.brow_variance_threshold", detection.brow_variance_threshold),
            ("detection.eye_region_threshold", detection.eye_region_threshold),
        ];
        for (name, value) in intensities {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackerError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if detection.brow_very_angry_threshold > detection.brow_angry_threshold {
            return Err(invalid(
                "detection.brow_very_angry_threshold must not exceed detection.brow_angry_threshold",
            ));
        }

        let extractor = &self.extractor;
        let scale_ok = |factor: f64| factor.is_finite() && factor > 1.0;
        if !scale_ok(extractor.smile_scale_factor) || !scale_ok(extractor.eye_scale_factor) {
            return Err(invalid("extractor scale factors must be greater than 1.0"));
        }
        if extractor.smile_min_neighbors == 0 || extractor.eye_min_neighbors == 0 {
            return Err(invalid("extractor min_neighbors must be at least 1"));
        }

        Ok(())
    }

    /// Parse and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, TrackerError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            warn!(error = %e, "rejected engine config");
            return Err(e);
        }
        Ok(config)
    }

    /// Serialize config to pretty JSON
    pub fn to_json(&self) -> Result<String, TrackerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        info!(path = %path.display(), policy = ?config.policy, "loaded engine config");
        Ok(config)
    }

    /// Write config to a file as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), TrackerError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn invalid(msg: &str) -> TrackerError {
    TrackerError::InvalidConfig(msg.to_string())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
