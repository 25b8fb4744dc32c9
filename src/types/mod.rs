pub mod geometry;

pub use geometry::*;

use serde::{Deserialize, Serialize};

/// Milliseconds on the sensor's monotonic clock
pub type Timestamp = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Which of the four tracked joints of a side a sample belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointRole {
    Knee,
    Ankle,
    Foot,
    Spine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointKind {
    KneeLeft,
    KneeRight,
    AnkleLeft,
    AnkleRight,
    FootLeft,
    FootRight,
    Spine,
}

impl JointKind {
    pub const ALL: [JointKind; 7] = [
        JointKind::Spine,
        JointKind::KneeLeft,
        JointKind::KneeRight,
        JointKind::AnkleLeft,
        JointKind::AnkleRight,
        JointKind::FootLeft,
        JointKind::FootRight,
    ];

    /// `None` for the spine, which belongs to both sides.
    pub fn side(&self) -> Option<Side> {
        match self {
            JointKind::KneeLeft | JointKind::AnkleLeft | JointKind::FootLeft => Some(Side::Left),
            JointKind::KneeRight | JointKind::AnkleRight | JointKind::FootRight => Some(Side::Right),
            JointKind::Spine => None,
        }
    }

    pub fn role(&self) -> JointRole {
        match self {
            JointKind::KneeLeft | JointKind::KneeRight => JointRole::Knee,
            JointKind::AnkleLeft | JointKind::AnkleRight => JointRole::Ankle,
            JointKind::FootLeft | JointKind::FootRight => JointRole::Foot,
            JointKind::Spine => JointRole::Spine,
        }
    }

    pub fn lateral(role: JointRole, side: Side) -> JointKind {
        match (role, side) {
            (JointRole::Knee, Side::Left) => JointKind::KneeLeft,
            (JointRole::Knee, Side::Right) => JointKind::KneeRight,
            (JointRole::Ankle, Side::Left) => JointKind::AnkleLeft,
            (JointRole::Ankle, Side::Right) => JointKind::AnkleRight,
            (JointRole::Foot, Side::Left) => JointKind::FootLeft,
            (JointRole::Foot, Side::Right) => JointKind::FootRight,
            (JointRole::Spine, _) => JointKind::Spine,
        }
    }

    pub fn is_foot(&self) -> bool {
        self.role() == JointRole::Foot
    }
}

/// One tracked joint position. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub timestamp: Timestamp,
    pub position: Position,
    pub joint: JointKind,
}

impl JointSample {
    pub fn new(timestamp: Timestamp, position: Position, joint: JointKind) -> Self {
        Self {
            timestamp,
            position,
            joint,
        }
    }
}

/// Event delivered by the body-tracking collaborator for each joint of each frame
pub type JointTracked = JointSample;

/// Emitted once per recognized stamp
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StampDetected {
    pub side: Side,
    /// Most recent spine position at detection time
    pub position: Position,
    /// Timestamp of the foot sample that triggered the evaluation
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_sides() {
        assert_eq!(JointKind::KneeLeft.side(), Some(Side::Left));
        assert_eq!(JointKind::FootRight.side(), Some(Side::Right));
        assert_eq!(JointKind::Spine.side(), None);
    }

    #[test]
    fn test_lateral_round_trip_roles() {
        for side in Side::BOTH {
            for role in [JointRole::Knee, JointRole::Ankle, JointRole::Foot] {
                let kind = JointKind::lateral(role, side);
                assert_eq!(kind.role(), role);
                assert_eq!(kind.side(), Some(side));
            }
        }
        assert!(JointKind::FootLeft.is_foot());
        assert!(!JointKind::AnkleLeft.is_foot());
    }
}
