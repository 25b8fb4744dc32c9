use std::collections::BTreeMap;
use std::ops::RangeBounds;

use crate::extremum::{find_extremum, Bound, Extremum};
use crate::types::{Coordinate, JointSample, Timestamp};

/// Rolling, timestamp-keyed store of one joint's recent samples
///
/// Holds at most one sample per timestamp (a re-insert replaces the old one)
/// and, after every insert, only the samples within `retention_ms` of the
/// sample just inserted.
#[derive(Clone, Debug)]
pub struct TimeWindow {
    samples: BTreeMap<Timestamp, JointSample>,
    retention_ms: i64,
}

impl TimeWindow {
    pub fn new(retention_ms: i64) -> Self {
        TimeWindow {
            samples: BTreeMap::new(),
            retention_ms,
        }
    }

    /// Insert or replace by timestamp, then evict relative to the new sample.
    pub fn insert(&mut self, sample: JointSample) {
        let timestamp = sample.timestamp;
        self.samples.insert(timestamp, sample);
        self.evict(timestamp, self.retention_ms);
    }

    /// Drop every entry with `current - timestamp > retention_ms`.
    pub fn evict(&mut self, current: Timestamp, retention_ms: i64) {
        let oldest_kept = current.saturating_sub(retention_ms);
        self.samples = self.samples.split_off(&oldest_kept);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, timestamp: Timestamp) -> Option<&JointSample> {
        self.samples.get(&timestamp)
    }

    /// Sample with the greatest timestamp
    pub fn latest(&self) -> Option<&JointSample> {
        self.samples.values().next_back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JointSample> {
        self.samples.values()
    }

    pub(crate) fn range<R>(&self, range: R) -> impl Iterator<Item = &JointSample>
    where
        R: RangeBounds<Timestamp>,
    {
        self.samples.range(range).map(|(_, sample)| sample)
    }

    pub fn min_by(&self, coord: Coordinate) -> Option<&JointSample> {
        find_extremum(self, coord, Extremum::Min, Bound::All)
    }

    pub fn max_by(&self, coord: Coordinate) -> Option<&JointSample> {
        find_extremum(self, coord, Extremum::Max, Bound::All)
    }

    pub fn min_before(&self, coord: Coordinate, pivot: Timestamp) -> Option<&JointSample> {
        find_extremum(self, coord, Extremum::Min, Bound::Before(pivot))
    }

    pub fn min_after(&self, coord: Coordinate, pivot: Timestamp) -> Option<&JointSample> {
        find_extremum(self, coord, Extremum::Min, Bound::After(pivot))
    }

    pub fn max_before(&self, coord: Coordinate, pivot: Timestamp) -> Option<&JointSample> {
        find_extremum(self, coord, Extremum::Max, Bound::Before(pivot))
    }

    pub fn max_after(&self, coord: Coordinate, pivot: Timestamp) -> Option<&JointSample> {
        find_extremum(self, coord, Extremum::Max, Bound::After(pivot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JointKind, Position};

    fn foot(t: i64, y: f64) -> JointSample {
        JointSample::new(t, Position::new(0.0, y, 1.0), JointKind::FootLeft)
    }

    #[test]
    fn test_replace_on_duplicate_timestamp() {
        let mut window = TimeWindow::new(1000);
        window.insert(foot(100, 0.2));
        window.insert(foot(100, 0.4));

        assert_eq!(window.len(), 1);
        assert_eq!(window.get(100), Some(&foot(100, 0.4)));
    }

    #[test]
    fn test_retention_after_every_insert() {
        let mut window = TimeWindow::new(1000);
        for t in (0..=5000).step_by(70) {
            window.insert(foot(t, 0.1));
            assert!(window.iter().all(|s| t - s.timestamp <= 1000));
        }
    }

    #[test]
    fn test_boundary_sample_is_kept() {
        let mut window = TimeWindow::new(1000);
        window.insert(foot(0, 0.1));
        window.insert(foot(1000, 0.1));
        assert_eq!(window.len(), 2);

        window.insert(foot(1001, 0.1));
        assert_eq!(window.len(), 2);
        assert!(window.get(0).is_none());
    }

    #[test]
    fn test_stale_pivot_evicted() {
        let mut window = TimeWindow::new(1000);
        window.insert(foot(0, 0.9));
        for t in (100..=1500).step_by(100) {
            window.insert(foot(t, 0.2));
        }
        let max = window.max_by(Coordinate::Y).unwrap();
        assert_ne!(max.timestamp, 0);
        assert!((max.position.y - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_latest_and_clear() {
        let mut window = TimeWindow::new(1000);
        assert!(window.latest().is_none());

        window.insert(foot(300, 0.1));
        window.insert(foot(200, 0.1));
        assert_eq!(window.latest().map(|s| s.timestamp), Some(300));

        window.clear();
        assert!(window.is_empty());
        assert!(window.min_by(Coordinate::Y).is_none());
    }
}
