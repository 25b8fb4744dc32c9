//! Extremum lookups over a [`TimeWindow`].
//!
//! Every lookup returns `None` when no sample qualifies; callers treat that
//! as "not enough data" rather than a failure. When several samples share the
//! extremal value the earliest one wins.

use std::ops::Bound as RangeBound;

use crate::types::{Coordinate, JointSample, Timestamp};
use crate::window::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

/// Which part of the window a lookup may consider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    All,
    /// Strictly before the pivot timestamp
    Before(Timestamp),
    /// Strictly after the pivot timestamp
    After(Timestamp),
}

pub fn find_extremum(
    window: &TimeWindow,
    coord: Coordinate,
    extremum: Extremum,
    bound: Bound,
) -> Option<&JointSample> {
    let range = match bound {
        Bound::All => (RangeBound::Unbounded, RangeBound::Unbounded),
        Bound::Before(pivot) => (RangeBound::Unbounded, RangeBound::Excluded(pivot)),
        Bound::After(pivot) => (RangeBound::Excluded(pivot), RangeBound::Unbounded),
    };

    let mut best: Option<&JointSample> = None;
    for sample in window.range(range) {
        let value = sample.position.get(coord);
        let better = match best {
            None => true,
            Some(current) => {
                let current_value = current.position.get(coord);
                match extremum {
                    Extremum::Min => value < current_value,
                    Extremum::Max => value > current_value,
                }
            }
        };
        if better {
            best = Some(sample);
        }
    }
    best
}
