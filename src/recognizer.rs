// recognizer.rs: ingestion boundary of the stamp tracker
//
// Owns both sides' joint tracks and evaluators. Joint events come in on the
// caller's thread (one frame at a time); foot events kick off evaluation on
// the side's worker and return at once.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::warn;

use crate::bus::GestureBus;
use crate::config::RecognizerConfig;
use crate::error::{RecognizerError, Result};
use crate::evaluator::{Dispatch, EvaluatorCounts, SideEvaluator};
use crate::frame::SkeletonFrame;
use crate::matcher::{PatternMatcher, StampPatternMatcher};
use crate::tracking::SideTracks;
use crate::types::{JointTracked, Side};

struct SideState {
    tracks: Arc<Mutex<SideTracks>>,
    evaluator: SideEvaluator,
}

pub struct StampRecognizer {
    config: RecognizerConfig,
    bus: GestureBus,
    left: SideState,
    right: SideState,
}

impl StampRecognizer {
    pub fn new(config: RecognizerConfig) -> Result<Self> {
        let matcher = Arc::new(StampPatternMatcher::new(config.thresholds));
        Self::with_matcher(config, matcher)
    }

    /// Build with a custom matcher shared by both sides.
    pub fn with_matcher(config: RecognizerConfig, matcher: Arc<dyn PatternMatcher>) -> Result<Self> {
        config.validate()?;
        let bus = GestureBus::new();
        let left = Self::side_state(Side::Left, &config, matcher.clone(), bus.clone())?;
        let right = Self::side_state(Side::Right, &config, matcher, bus.clone())?;
        Ok(StampRecognizer {
            config,
            bus,
            left,
            right,
        })
    }

    fn side_state(
        side: Side,
        config: &RecognizerConfig,
        matcher: Arc<dyn PatternMatcher>,
        bus: GestureBus,
    ) -> Result<SideState> {
        let tracks = Arc::new(Mutex::new(SideTracks::new(side, config.retention_ms)));
        let evaluator = SideEvaluator::spawn(side, tracks.clone(), matcher, bus)?;
        Ok(SideState { tracks, evaluator })
    }

    fn state(&self, side: Side) -> &SideState {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn bus(&self) -> &GestureBus {
        &self.bus
    }

    /// Store one joint event. Foot events return whether an evaluation was
    /// started; every other joint returns `None`.
    pub fn ingest(&self, event: JointTracked) -> Result<Option<Dispatch>> {
        if !event.position.is_finite() {
            return Err(RecognizerError::InvalidSample {
                joint: event.joint,
                timestamp: event.timestamp,
                reason: "non-finite coordinate".to_string(),
            });
        }

        match event.joint.side() {
            // Spine is tracked once per side so each side can clear its own copy
            None => {
                for side in Side::BOTH {
                    self.lock_tracks(side)?.insert(event);
                }
                Ok(None)
            }
            Some(side) => {
                self.lock_tracks(side)?.insert(event);
                if event.joint.is_foot() {
                    self.state(side).evaluator.on_foot_sample(event.timestamp).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Ingest every joint of a tracked skeleton frame. Malformed samples are
    /// skipped and counted; the rest of the frame still goes in.
    pub fn ingest_frame(&self, frame: &SkeletonFrame) -> Result<usize> {
        let mut rejected = 0;
        for event in frame.joint_events() {
            match self.ingest(event) {
                Ok(_) => {}
                Err(e @ RecognizerError::InvalidSample { .. }) => {
                    warn!("Rejected sample in frame t={}: {}", frame.timestamp, e);
                    rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(rejected)
    }

    fn lock_tracks(&self, side: Side) -> Result<std::sync::MutexGuard<'_, SideTracks>> {
        self.state(side)
            .tracks
            .lock()
            .map_err(|_| RecognizerError::LockPoisoned(format!("{} side tracks", side.as_str())))
    }

    /// Sample counts as (knee, ankle, foot, spine)
    pub fn window_lengths(&self, side: Side) -> Result<(usize, usize, usize, usize)> {
        Ok(self.lock_tracks(side)?.lengths())
    }

    pub fn is_busy(&self, side: Side) -> bool {
        self.state(side).evaluator.is_busy()
    }

    /// Wait for both sides' in-flight evaluations. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.left.evaluator.wait_idle(timeout) && self.right.evaluator.wait_idle(timeout)
    }

    pub fn counts(&self, side: Side) -> EvaluatorCounts {
        self.state(side).evaluator.counts()
    }

    pub fn total_counts(&self) -> EvaluatorCounts {
        self.counts(Side::Left) + self.counts(Side::Right)
    }
}
