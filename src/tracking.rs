use crate::types::{JointRole, JointSample, Side};
use crate::window::TimeWindow;

/// The four joint tracks of one body side
///
/// Cloning produces the deep copy handed to an evaluation worker.
#[derive(Clone, Debug)]
pub struct SideTracks {
    pub side: Side,
    pub knee: TimeWindow,
    pub ankle: TimeWindow,
    pub foot: TimeWindow,
    pub spine: TimeWindow,
}

impl SideTracks {
    pub fn new(side: Side, retention_ms: i64) -> Self {
        SideTracks {
            side,
            knee: TimeWindow::new(retention_ms),
            ankle: TimeWindow::new(retention_ms),
            foot: TimeWindow::new(retention_ms),
            spine: TimeWindow::new(retention_ms),
        }
    }

    pub fn window_mut(&mut self, role: JointRole) -> &mut TimeWindow {
        match role {
            JointRole::Knee => &mut self.knee,
            JointRole::Ankle => &mut self.ankle,
            JointRole::Foot => &mut self.foot,
            JointRole::Spine => &mut self.spine,
        }
    }

    /// Route a sample into the window of its joint role. The caller decides
    /// which side a sample belongs to; spine samples go to both.
    pub fn insert(&mut self, sample: JointSample) {
        self.window_mut(sample.joint.role()).insert(sample);
    }

    pub fn clear(&mut self) {
        self.knee.clear();
        self.ankle.clear();
        self.foot.clear();
        self.spine.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.knee.is_empty() && self.ankle.is_empty() && self.foot.is_empty() && self.spine.is_empty()
    }

    /// Sample counts as (knee, ankle, foot, spine)
    pub fn lengths(&self) -> (usize, usize, usize, usize) {
        (self.knee.len(), self.ankle.len(), self.foot.len(), self.spine.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JointKind, Position};

    #[test]
    fn test_routing_by_role() {
        let mut tracks = SideTracks::new(Side::Left, 1000);
        tracks.insert(JointSample::new(0, Position::default(), JointKind::KneeLeft));
        tracks.insert(JointSample::new(0, Position::default(), JointKind::FootLeft));
        tracks.insert(JointSample::new(10, Position::default(), JointKind::FootLeft));
        tracks.insert(JointSample::new(0, Position::default(), JointKind::Spine));

        assert_eq!(tracks.lengths(), (1, 0, 2, 1));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut tracks = SideTracks::new(Side::Right, 1000);
        tracks.insert(JointSample::new(0, Position::default(), JointKind::AnkleRight));

        let snapshot = tracks.clone();
        tracks.clear();

        assert!(tracks.is_empty());
        assert_eq!(snapshot.ankle.len(), 1);
    }
}
