use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::evaluator::EvaluatorCounts;
use crate::recognizer::StampRecognizer;
use crate::types::{Position, Side, StampDetected};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SideStatus {
    pub foot_arrivals: u64,
    pub evaluations_started: u64,
    pub busy_drops: u64,
    pub stamps: u64,
    pub busy: bool,
    // Current window sizes
    pub knee_samples: usize,
    pub ankle_samples: usize,
    pub foot_samples: usize,
    pub spine_samples: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub uptime_seconds: u64,
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub invalid_samples: u64,
    pub left: SideStatus,
    pub right: SideStatus,
    // Most recent detection
    pub last_stamp_side: Option<Side>,
    pub last_stamp_timestamp: Option<i64>,
    pub last_stamp_position: Option<Position>,
    // Item selection
    pub selector_calibrated: bool,
    pub hovered_item: Option<usize>,
    pub selected_item: Option<usize>,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            uptime_seconds: 0,
            frames_received: 0,
            frames_dropped: 0,
            invalid_samples: 0,
            left: SideStatus::default(),
            right: SideStatus::default(),
            last_stamp_side: None,
            last_stamp_timestamp: None,
            last_stamp_position: None,
            selector_calibrated: false,
            hovered_item: None,
            selected_item: None,
        }
    }

    /// Refresh per-side counters and window sizes from the recognizer.
    pub fn update_from(&mut self, recognizer: &StampRecognizer) {
        self.timestamp = current_timestamp();
        for side in Side::BOTH {
            let counts = recognizer.counts(side);
            let lengths = recognizer.window_lengths(side).unwrap_or_default();
            let status = side_status(counts, lengths, recognizer.is_busy(side));
            match side {
                Side::Left => self.left = status,
                Side::Right => self.right = status,
            }
        }
    }

    pub fn record_stamp(&mut self, stamp: &StampDetected) {
        self.last_stamp_side = Some(stamp.side);
        self.last_stamp_timestamp = Some(stamp.timestamp);
        self.last_stamp_position = Some(stamp.position);
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self::new()
    }
}

fn side_status(
    counts: EvaluatorCounts,
    (knee, ankle, foot, spine): (usize, usize, usize, usize),
    busy: bool,
) -> SideStatus {
    SideStatus {
        foot_arrivals: counts.foot_arrivals,
        evaluations_started: counts.evaluations_started,
        busy_drops: counts.busy_drops,
        stamps: counts.matches,
        busy,
        knee_samples: knee,
        ankle_samples: ankle,
        foot_samples: foot,
        spine_samples: spine,
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecognizerConfig;
    use crate::types::{JointKind, JointSample};
    use std::time::Duration;

    #[test]
    fn test_update_from_recognizer() {
        let recognizer = StampRecognizer::new(RecognizerConfig::default()).unwrap();
        recognizer
            .ingest(JointSample::new(0, Position::new(0.0, 1.0, 2.0), JointKind::Spine))
            .unwrap();
        recognizer
            .ingest(JointSample::new(0, Position::new(0.0, 0.1, 2.0), JointKind::FootRight))
            .unwrap();
        assert!(recognizer.wait_idle(Duration::from_secs(5)));

        let mut status = LiveStatus::new();
        status.update_from(&recognizer);

        assert_eq!(status.left.spine_samples, 1);
        assert_eq!(status.left.foot_arrivals, 0);
        assert_eq!(status.right.foot_samples, 1);
        assert_eq!(status.right.evaluations_started, 1);
        assert!(!status.right.busy);
    }

    #[test]
    fn test_serializes_last_stamp() {
        let mut status = LiveStatus::new();
        status.record_stamp(&StampDetected {
            side: Side::Right,
            position: Position::new(1.0, 1.0, 2.0),
            timestamp: 400,
        });
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["last_stamp_side"], "Right");
        assert_eq!(json["last_stamp_timestamp"], 400);
    }
}
