//! Per-frame emotion classification
//!
//! Turns one `FeatureSample` into a label and a 0-100 confidence. The function
//! is pure: the same sample and thresholds always give the same result, so it
//! can be exercised on synthetic samples without a camera.

use crate::config::{ClassificationPolicy, DetectionThresholds, EngineConfig};
use crate::types::{ClassificationResult, EmotionLabel, FeatureSample};

/// Minimum eye detections for the face to count as well resolved
const MIN_EYES_RESOLVED: u32 = 2;

/// Confidence when only a deeply furrowed brow is visible (graded policy)
const BROW_ONLY_ANGER_CONFIDENCE: u8 = 60;

/// Binary policy confidences
const BINARY_HAPPY_BASE: u8 = 85;
const BINARY_ANGRY_CONFIDENCE: u8 = 80;
const BINARY_UNRESOLVED_CONFIDENCE: u8 = 30;

/// Classifier for a fixed policy and threshold set
#[derive(Debug, Clone)]
pub struct Classifier {
    policy: ClassificationPolicy,
    thresholds: DetectionThresholds,
}

impl Classifier {
    pub fn new(policy: ClassificationPolicy, thresholds: DetectionThresholds) -> Self {
        Self { policy, thresholds }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.policy, config.detection.clone())
    }

    pub fn policy(&self) -> ClassificationPolicy {
        self.policy
    }

    /// Classify one frame. Rules are checked in priority order; the first match wins.
    pub fn classify(&self, sample: &FeatureSample) -> ClassificationResult {
        if sample.smile_hit_count > 0 {
            return ClassificationResult::new(
                EmotionLabel::Happy,
                smile_confidence(self.policy, sample.smile_hit_count),
            );
        }

        match self.policy {
            ClassificationPolicy::Graded => self.classify_graded(sample),
            ClassificationPolicy::Binary => classify_binary(sample),
        }
    }

    fn classify_graded(&self, sample: &FeatureSample) -> ClassificationResult {
        let t = &self.thresholds;

        if sample.eye_hit_count >= MIN_EYES_RESOLVED {
            let score = anger_score(sample, t);
            return if score >= t.anger_score_threshold {
                ClassificationResult::new(EmotionLabel::Angry, score.min(100) as u8)
            } else {
                ClassificationResult::new(EmotionLabel::Neutral, 0)
            };
        }

        if sample.brow_mean < t.brow_very_angry_threshold {
            ClassificationResult::new(EmotionLabel::Angry, BROW_ONLY_ANGER_CONFIDENCE)
        } else {
            ClassificationResult::new(EmotionLabel::Neutral, 0)
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Happy confidence for `hits` smile detections
///
/// Graded: `min(hits * 30, 100)`. Binary: `85 + min(hits * 5, 15)`.
fn smile_confidence(policy: ClassificationPolicy, hits: u32) -> u8 {
    match policy {
        ClassificationPolicy::Graded => hits.saturating_mul(30).min(100) as u8,
        ClassificationPolicy::Binary => BINARY_HAPPY_BASE + hits.saturating_mul(5).min(15) as u8,
    }
}

/// Accumulate the anger score from the intensity cut-points
///
/// ```text
/// +30  brow darker than brow_angry_threshold
/// +20  brow darker than brow_very_angry_threshold (on top of the above)
/// +25  mouth darker than mouth_tense_threshold
/// +15  brow variance above brow_variance_threshold
/// +10  eye band darker than eye_region_threshold
/// ```
fn anger_score(sample: &FeatureSample, t: &DetectionThresholds) -> u32 {
    let mut score = 0;
    if sample.brow_mean < t.brow_angry_threshold {
        score += 30;
    }
    if sample.brow_mean < t.brow_very_angry_threshold {
        score += 20;
    }
    if sample.mouth_mean < t.mouth_tense_threshold {
        score += 25;
    }
    if sample.brow_variance > t.brow_variance_threshold {
        score += 15;
    }
    if sample.eye_region_mean < t.eye_region_threshold {
        score += 10;
    }
    score
}

fn classify_binary(sample: &FeatureSample) -> ClassificationResult {
    if sample.eye_hit_count < MIN_EYES_RESOLVED {
        ClassificationResult::new(EmotionLabel::Neutral, BINARY_UNRESOLVED_CONFIDENCE)
    } else {
        ClassificationResult::new(EmotionLabel::Angry, BINARY_ANGRY_CONFIDENCE)
    }
}
