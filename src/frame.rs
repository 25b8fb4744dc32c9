use serde::{Deserialize, Serialize};

use crate::types::{JointKind, JointRole, JointSample, JointTracked, Position, Timestamp};

/// One tracked body as delivered by the skeleton tracker for a single frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonFrame {
    pub timestamp: Timestamp,
    #[serde(default)]
    pub tracking_id: u32,
    #[serde(default = "default_tracked")]
    pub tracked: bool,
    pub joints: Vec<FrameJoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameJoint {
    pub joint: JointKind,
    pub position: Position,
}

fn default_tracked() -> bool {
    true
}

/// Feet go last so an evaluation triggered by a foot sees the rest of the
/// frame already stored.
fn routing_rank(joint: JointKind) -> u8 {
    match joint.role() {
        JointRole::Spine => 0,
        JointRole::Knee => 1,
        JointRole::Ankle => 2,
        JointRole::Foot => 3,
    }
}

impl SkeletonFrame {
    pub fn new(timestamp: Timestamp, tracking_id: u32) -> Self {
        Self {
            timestamp,
            tracking_id,
            tracked: true,
            joints: Vec::with_capacity(JointKind::ALL.len()),
        }
    }

    pub fn with_joint(mut self, joint: JointKind, position: Position) -> Self {
        self.joints.push(FrameJoint { joint, position });
        self
    }

    pub fn untracked(mut self) -> Self {
        self.tracked = false;
        self
    }

    /// Per-joint events for this frame; empty for an untracked skeleton.
    pub fn joint_events(&self) -> Vec<JointTracked> {
        if !self.tracked {
            return Vec::new();
        }
        let mut events: Vec<JointTracked> = self
            .joints
            .iter()
            .map(|j| JointSample::new(self.timestamp, j.position, j.joint))
            .collect();
        events.sort_by_key(|e| routing_rank(e.joint));
        events
    }
}
