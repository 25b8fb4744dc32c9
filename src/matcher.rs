//! Stamp shape matching
//!
//! A stamp is a knee that dips towards the sensor and comes back, while the
//! ankle and foot of the same side rise and drop again, the foot landing close
//! to where it took off. All three must be visible inside the current
//! windows of one side.

use log::debug;

use crate::config::StampThresholds;
use crate::tracking::SideTracks;
use crate::types::{Coordinate, Position};
use crate::window::TimeWindow;

/// Decides whether a snapshot of one side's tracks contains the gesture.
///
/// Implementations run on the evaluation worker, never on the ingestion path.
pub trait PatternMatcher: Send + Sync {
    /// Position to report for a match, or `None`.
    fn evaluate(&self, tracks: &SideTracks) -> Option<Position>;
}

/// Per-joint outcome of one evaluation; `false` covers missing data too.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StampCheck {
    pub knee: bool,
    pub ankle: bool,
    pub foot: bool,
}

impl StampCheck {
    pub fn is_stamp(&self) -> bool {
        self.knee && self.ankle && self.foot
    }
}

#[derive(Clone, Debug, Default)]
pub struct StampPatternMatcher {
    thresholds: StampThresholds,
}

impl StampPatternMatcher {
    pub fn new(thresholds: StampThresholds) -> Self {
        Self { thresholds }
    }

    pub fn inspect(&self, tracks: &SideTracks) -> StampCheck {
        StampCheck {
            knee: self.knee_bends(&tracks.knee).unwrap_or(false),
            ankle: self.lifts_and_drops(&tracks.ankle).unwrap_or(false),
            foot: self.foot_stamps(&tracks.foot).unwrap_or(false),
        }
    }

    /// Deepest knee sample must sit at least `min_knee_depth_change` below the
    /// shallowest sample on each side of it in time.
    fn knee_bends(&self, knee: &TimeWindow) -> Option<bool> {
        let pivot = knee.min_by(Coordinate::Z)?;
        let before = knee.max_before(Coordinate::Z, pivot.timestamp)?;
        let after = knee.max_after(Coordinate::Z, pivot.timestamp)?;

        let min_change = self.thresholds.min_knee_depth_change;
        Some(
            before.position.depth() - pivot.position.depth() >= min_change
                && after.position.depth() - pivot.position.depth() >= min_change,
        )
    }

    fn lifts_and_drops(&self, joint: &TimeWindow) -> Option<bool> {
        let pivot = joint.max_by(Coordinate::Y)?;
        let before = joint.min_before(Coordinate::Y, pivot.timestamp)?;
        let after = joint.min_after(Coordinate::Y, pivot.timestamp)?;

        let min_change = self.thresholds.min_foot_height_change;
        Some(
            pivot.position.height() - before.position.height() >= min_change
                && pivot.position.height() - after.position.height() >= min_change,
        )
    }

    /// Ankle-style lift plus the foot coming down near its take-off depth,
    /// which tells a stamp apart from a stride.
    fn foot_stamps(&self, foot: &TimeWindow) -> Option<bool> {
        if !self.lifts_and_drops(foot)? {
            return Some(false);
        }

        let pivot = foot.max_by(Coordinate::Y)?;
        let before = foot.min_before(Coordinate::Y, pivot.timestamp)?;
        let after = foot.min_after(Coordinate::Y, pivot.timestamp)?;

        let max_change = self.thresholds.max_foot_depth_change;
        Some(
            (pivot.position.depth() - before.position.depth()).abs() <= max_change
                && (pivot.position.depth() - after.position.depth()).abs() <= max_change,
        )
    }
}

impl PatternMatcher for StampPatternMatcher {
    fn evaluate(&self, tracks: &SideTracks) -> Option<Position> {
        let check = self.inspect(tracks);
        debug!(
            "[{}] stamp check: knee={} ankle={} foot={} (samples {:?})",
            tracks.side.as_str(),
            check.knee,
            check.ankle,
            check.foot,
            tracks.lengths()
        );

        if !check.is_stamp() {
            return None;
        }
        tracks.spine.latest().map(|spine| spine.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JointKind, JointSample, Side};

    fn tracks_with(
        knee_depths: &[(i64, f64)],
        ankle_heights: &[(i64, f64)],
        foot: &[(i64, f64, f64)],
    ) -> SideTracks {
        let mut tracks = SideTracks::new(Side::Left, 1000);
        for &(t, z) in knee_depths {
            tracks.insert(JointSample::new(t, Position::new(0.0, 0.5, z), JointKind::KneeLeft));
        }
        for &(t, y) in ankle_heights {
            tracks.insert(JointSample::new(t, Position::new(0.0, y, 1.0), JointKind::AnkleLeft));
        }
        for &(t, y, z) in foot {
            tracks.insert(JointSample::new(t, Position::new(0.0, y, z), JointKind::FootLeft));
        }
        tracks
    }

    fn stamp_tracks() -> SideTracks {
        let mut tracks = tracks_with(
            &[(0, 0.5), (200, 0.3), (400, 0.5)],
            &[(0, 0.2), (200, 0.4), (400, 0.2)],
            &[(0, 0.2, 1.0), (200, 0.4, 1.0), (400, 0.2, 1.05)],
        );
        tracks.insert(JointSample::new(100, Position::new(0.0, 0.0, 0.0), JointKind::Spine));
        tracks.insert(JointSample::new(400, Position::new(1.0, 1.0, 2.0), JointKind::Spine));
        tracks
    }

    #[test]
    fn test_stamp_matches_with_latest_spine() {
        let matcher = StampPatternMatcher::default();
        let tracks = stamp_tracks();

        assert!(matcher.inspect(&tracks).is_stamp());
        assert_eq!(matcher.evaluate(&tracks), Some(Position::new(1.0, 1.0, 2.0)));
    }

    #[test]
    fn test_shallow_knee_rejected() {
        let matcher = StampPatternMatcher::default();
        let mut tracks = stamp_tracks();
        tracks.knee.clear();
        for (t, z) in [(0, 0.35), (200, 0.3), (400, 0.32)] {
            tracks.insert(JointSample::new(t, Position::new(0.0, 0.5, z), JointKind::KneeLeft));
        }

        let check = matcher.inspect(&tracks);
        assert!(!check.knee);
        assert!(check.ankle && check.foot);
        assert_eq!(matcher.evaluate(&tracks), None);
    }

    #[test]
    fn test_stride_rejected_by_foot_depth() {
        let matcher = StampPatternMatcher::default();
        let mut tracks = stamp_tracks();
        tracks.foot.clear();
        for (t, y, z) in [(0, 0.2, 1.0), (200, 0.4, 1.2), (400, 0.2, 1.5)] {
            tracks.insert(JointSample::new(t, Position::new(0.0, y, z), JointKind::FootLeft));
        }

        let check = matcher.inspect(&tracks);
        assert!(check.knee && check.ankle);
        assert!(!check.foot);
    }

    #[test]
    fn test_pivot_at_window_edge_is_no_match() {
        // Ankle peaks on the newest sample, so nothing comes after the pivot.
        let matcher = StampPatternMatcher::default();
        let tracks = tracks_with(
            &[(0, 0.5), (200, 0.3), (400, 0.5)],
            &[(0, 0.2), (200, 0.3), (400, 0.5)],
            &[(0, 0.2, 1.0), (200, 0.4, 1.0), (400, 0.2, 1.0)],
        );
        assert!(!matcher.inspect(&tracks).ankle);
    }

    #[test]
    fn test_empty_tracks_no_match() {
        let matcher = StampPatternMatcher::default();
        let tracks = SideTracks::new(Side::Right, 1000);
        assert_eq!(matcher.inspect(&tracks), StampCheck::default());
        assert_eq!(matcher.evaluate(&tracks), None);
    }

    #[test]
    fn test_missing_spine_no_match() {
        let matcher = StampPatternMatcher::default();
        let mut tracks = stamp_tracks();
        tracks.spine.clear();
        assert!(matcher.inspect(&tracks).is_stamp());
        assert_eq!(matcher.evaluate(&tracks), None);
    }
}
