//! Rage Tracker - emotion classification and temporal smoothing engine
//!
//! Turns per-frame facial-feature measurements into stable, countable emotion
//! events and per-session statistics through a deterministic pipeline:
//! classification → debounce/confirmation → streak and peak tracking →
//! session summary.
//!
//! ## Modules
//!
//! - **Engine**: `Classifier`, `Debouncer`, `StreakTracker`, `SessionAggregator`
//! - **Replay**: parse, validate, and replay recorded frame streams
//! - **Reporting**: provenance-stamped session reports
//! - **FFI**: C ABI for capture loops written in other languages

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod debounce;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod replay;
pub mod streak;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregator::{emotional_trend, SessionAggregator};
pub use classifier::Classifier;
pub use config::{
    ClassificationPolicy, ConfigProfile, DebounceSettings, DetectionThresholds, EngineConfig,
    ExtractorHints,
};
pub use debounce::{DebounceState, Debouncer};
pub use encoder::{SummaryEncoder, REPORT_VERSION};
pub use error::TrackerError;
pub use pipeline::{ndjson_to_summary_json, replay_session, replay_to_summary};
pub use replay::{FrameRecord, FrameReplay, FrameValidationError, ReplayFormat};
pub use streak::StreakTracker;
pub use types::{
    ClassificationResult, EmotionCounts, EmotionEvent, EmotionLabel, FeatureSample, FrameOutcome,
    HappinessStreak, PeakMoment, RageLevel, SessionReport, SessionSummary, Streak,
};

/// Engine version embedded in every report
pub const TRACKER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for session reports
pub const PRODUCER_NAME: &str = "rage-tracker";
