//! Session report encoding
//!
//! Wraps a `SessionSummary` with producer metadata and a rage rating so the
//! reporting surface can tell which engine build produced it and when.

use crate::error::TrackerError;
use crate::types::{ReportProducer, SessionReport, SessionSummary};
use crate::{PRODUCER_NAME, TRACKER_VERSION};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder for session reports
pub struct SummaryEncoder {
    instance_id: String,
}

impl Default for SummaryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build a report stamped with the current time
    pub fn encode(&self, summary: &SessionSummary) -> SessionReport {
        self.encode_at(summary, Utc::now())
    }

    /// Build a report stamped with `computed_at`
    pub fn encode_at(&self, summary: &SessionSummary, computed_at: DateTime<Utc>) -> SessionReport {
        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: TRACKER_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: computed_at.to_rfc3339(),
            rage_level: summary.rage_level(),
            session: summary.clone(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(&self, summary: &SessionSummary) -> Result<String, TrackerError> {
        let report = self.encode(summary);
        serde_json::to_string_pretty(&report)
            .map_err(|e| TrackerError::EncodingError(e.to_string()))
    }
}
