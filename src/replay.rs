//! Recorded frame streams
//!
//! A capture loop can dump what it fed the engine, one `FrameRecord` per
//! frame, either as NDJSON (one record per line) or as a single JSON array.
//! Replaying such a file through a fresh `SessionAggregator` reproduces the
//! session summary offline.

use crate::error::TrackerError;
use crate::types::FeatureSample;
use serde::{Deserialize, Serialize};

/// One recorded frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Seconds since session start when the frame was captured
    pub elapsed_sec: f64,
    /// Features of the primary face; absent or null when no face was found
    #[serde(default)]
    pub face: Option<FeatureSample>,
}

impl FrameRecord {
    pub fn new(elapsed_sec: f64, face: Option<FeatureSample>) -> Self {
        Self { elapsed_sec, face }
    }

    /// Check the record on its own, ignoring its neighbours
    pub fn validate(&self) -> Result<(), FrameValidationError> {
        if !self.elapsed_sec.is_finite() {
            return Err(FrameValidationError::NonFiniteElapsed);
        }
        if self.elapsed_sec < 0.0 {
            return Err(FrameValidationError::NegativeElapsed {
                elapsed_sec: self.elapsed_sec,
            });
        }
        if let Some(field) = self.face.as_ref().and_then(FeatureSample::non_finite_field) {
            return Err(FrameValidationError::NonFiniteIntensity {
                field: field.to_string(),
            });
        }
        Ok(())
    }
}

/// Why a frame record was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameValidationError {
    #[error("elapsed_sec is not a finite number")]
    NonFiniteElapsed,

    #[error("elapsed_sec is negative ({elapsed_sec})")]
    NegativeElapsed { elapsed_sec: f64 },

    #[error("elapsed_sec went backwards: {previous} -> {current}")]
    ElapsedWentBackwards { previous: f64, current: f64 },

    #[error("face.{field} is not a finite number")]
    NonFiniteIntensity { field: String },
}

/// A rejected record and its position in the stream
#[derive(Debug, Clone, PartialEq)]
pub struct FrameIssue {
    /// 0-based record index
    pub index: usize,
    pub message: String,
    pub error: FrameValidationError,
}

/// Input layout of a recorded stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayFormat {
    /// One JSON object per line
    #[default]
    Ndjson,
    /// A single JSON array of records
    Json,
}

/// Parser and validator for recorded frame streams
pub struct FrameReplay;

impl FrameReplay {
    /// Parse input in the given layout
    pub fn parse(input: &str, format: ReplayFormat) -> Result<Vec<FrameRecord>, TrackerError> {
        match format {
            ReplayFormat::Ndjson => Self::parse_ndjson(input),
            ReplayFormat::Json => Self::parse_array(input),
        }
    }

    /// Parse a JSON array of records
    pub fn parse_array(json: &str) -> Result<Vec<FrameRecord>, TrackerError> {
        let records: Vec<FrameRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON, skipping blank lines
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<FrameRecord>, TrackerError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record = serde_json::from_str::<FrameRecord>(trimmed).map_err(|e| {
                TrackerError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Every rejected record, in stream order
    pub fn validate_all(records: &[FrameRecord]) -> Vec<FrameIssue> {
        let mut issues = Vec::new();
        let mut previous: Option<f64> = None;

        for (index, record) in records.iter().enumerate() {
            let result = record.validate().and_then(|()| match previous {
                Some(prev) if record.elapsed_sec < prev => {
                    Err(FrameValidationError::ElapsedWentBackwards {
                        previous: prev,
                        current: record.elapsed_sec,
                    })
                }
                _ => Ok(()),
            });

            match result {
                Ok(()) => previous = Some(record.elapsed_sec),
                Err(error) => issues.push(FrameIssue {
                    index,
                    message: error.to_string(),
                    error,
                }),
            }
        }
        issues
    }

    /// Fail on the first rejected record
    pub fn validate(records: &[FrameRecord]) -> Result<(), TrackerError> {
        match Self::validate_all(records).into_iter().next() {
            Some(issue) => Err(TrackerError::InvalidFrame {
                index: issue.index,
                reason: issue.message,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face() -> FeatureSample {
        FeatureSample {
            smile_hit_count: 1,
            eye_hit_count: 2,
            brow_mean: 101.5,
            brow_variance: 180.0,
            mouth_mean: 96.0,
            eye_region_mean: 88.0,
        }
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = r#"
{"elapsed_sec": 0.0, "face": null}

{"elapsed_sec": 0.033, "face": {"smile_hit_count": 1, "eye_hit_count": 2, "brow_mean": 101.5, "brow_variance": 180.0, "mouth_mean": 96.0, "eye_region_mean": 88.0}}
{"elapsed_sec": 0.066}
"#;
        let records = FrameReplay::parse_ndjson(input).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].face, None);
        assert_eq!(records[1].face, Some(face()));
        // Missing face key reads as no face
        assert_eq!(records[2].face, None);
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let input = "{\"elapsed_sec\": 0.0}\n{\"elapsed_sec\": \"soon\"}\n";
        let err = FrameReplay::parse_ndjson(input).unwrap_err();

        match err {
            TrackerError::ParseError(msg) => assert!(msg.contains("line 2"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_array() {
        let json = r#"[{"elapsed_sec": 0.5}, {"elapsed_sec": 1.0, "face": null}]"#;
        let records = FrameReplay::parse(json, ReplayFormat::Json).unwrap();
        assert_eq!(records, vec![FrameRecord::new(0.5, None), FrameRecord::new(1.0, None)]);
    }

    #[test]
    fn test_parse_array_rejects_object() {
        let err = FrameReplay::parse_array(r#"{"elapsed_sec": 0.5}"#).unwrap_err();
        assert!(matches!(err, TrackerError::JsonError(_)));
    }

    #[test]
    fn test_valid_stream_has_no_issues() {
        let records = vec![
            FrameRecord::new(0.0, None),
            FrameRecord::new(0.0, Some(face())),
            FrameRecord::new(0.5, Some(face())),
        ];
        assert!(FrameReplay::validate_all(&records).is_empty());
        assert!(FrameReplay::validate(&records).is_ok());
    }

    #[test]
    fn test_negative_elapsed_rejected() {
        let record = FrameRecord::new(-0.1, None);
        assert_eq!(
            record.validate(),
            Err(FrameValidationError::NegativeElapsed { elapsed_sec: -0.1 })
        );
    }

    #[test]
    fn test_non_finite_values_rejected() {
        assert_eq!(
            FrameRecord::new(f64::NAN, None).validate(),
            Err(FrameValidationError::NonFiniteElapsed)
        );

        let bad = FeatureSample {
            mouth_mean: f64::INFINITY,
            ..face()
        };
        assert_eq!(
            FrameRecord::new(1.0, Some(bad)).validate(),
            Err(FrameValidationError::NonFiniteIntensity {
                field: "mouth_mean".to_string()
            })
        );
    }

    #[test]
    fn test_backwards_elapsed_reported_with_index() {
        let records = vec![
            FrameRecord::new(1.0, None),
            FrameRecord::new(2.0, None),
            FrameRecord::new(1.5, None),
            FrameRecord::new(3.0, None),
        ];

        let issues = FrameReplay::validate_all(&records);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].index, 2);
        assert_eq!(
            issues[0].error,
            FrameValidationError::ElapsedWentBackwards {
                previous: 2.0,
                current: 1.5
            }
        );

        match FrameReplay::validate(&records) {
            Err(TrackerError::InvalidFrame { index, reason }) => {
                assert_eq!(index, 2);
                assert!(reason.contains("went backwards"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_rejected_record_does_not_move_the_clock() {
        let records = vec![
            FrameRecord::new(1.0, None),
            FrameRecord::new(-5.0, None),
            FrameRecord::new(1.2, None),
        ];
        let issues = FrameReplay::validate_all(&records);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].index, 1);
    }
}
