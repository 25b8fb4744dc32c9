//! Stamp-driven item selection
//!
//! The user first stamps once while standing at each item's spot. After
//! that, walking around hovers whichever calibrated spot is nearest and a
//! stamp selects the hovered item.

use serde::{Deserialize, Serialize};

use crate::types::{Position, StampDetected};

/// Items in the default 4×2 menu
pub const DEFAULT_ITEM_COUNT: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SelectionEvent {
    /// Item `index` was calibrated at `position`; `next` is waiting for a stamp
    ItemCalibrated {
        index: usize,
        position: Position,
        next: Option<usize>,
    },
    /// All items have a position
    Calibrated,
    Hovered {
        index: usize,
        previous: Option<usize>,
    },
    Selected {
        index: usize,
        previous: Option<usize>,
    },
}

#[derive(Clone, Debug)]
pub struct ItemSelector {
    item_count: usize,
    positions: Vec<Position>,
    hovered: Option<usize>,
    selected: Option<usize>,
}

impl Default for ItemSelector {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_COUNT)
    }
}

impl ItemSelector {
    pub fn new(item_count: usize) -> Self {
        ItemSelector {
            item_count,
            positions: Vec::with_capacity(item_count),
            hovered: None,
            selected: None,
        }
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn is_calibrated(&self) -> bool {
        self.positions.len() >= self.item_count
    }

    /// Item awaiting calibration, if any
    pub fn calibrating(&self) -> Option<usize> {
        (!self.is_calibrated()).then_some(self.positions.len())
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn item_position(&self, index: usize) -> Option<Position> {
        self.positions.get(index).copied()
    }

    /// Forget all calibrated positions and start over.
    pub fn recalibrate(&mut self) {
        self.positions.clear();
        self.hovered = None;
        self.selected = None;
    }

    pub fn on_stamp(&mut self, stamp: &StampDetected) -> Vec<SelectionEvent> {
        if let Some(index) = self.calibrating() {
            self.positions.push(stamp.position);
            let mut events = vec![SelectionEvent::ItemCalibrated {
                index,
                position: stamp.position,
                next: self.calibrating(),
            }];
            if self.is_calibrated() {
                events.push(SelectionEvent::Calibrated);
            }
            return events;
        }

        match self.hovered {
            Some(index) if self.selected != Some(index) => {
                let previous = self.selected.replace(index);
                vec![SelectionEvent::Selected { index, previous }]
            }
            _ => Vec::new(),
        }
    }

    /// Track the body position; only meaningful once calibrated.
    pub fn on_spine(&mut self, position: &Position) -> Option<SelectionEvent> {
        if !self.is_calibrated() {
            return None;
        }
        let nearest = self.nearest_item(position)?;
        if self.hovered == Some(nearest) {
            return None;
        }
        let previous = self.hovered.replace(nearest);
        Some(SelectionEvent::Hovered {
            index: nearest,
            previous,
        })
    }

    fn nearest_item(&self, position: &Position) -> Option<usize> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, item)| (i, position.distance_to(item)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn stamp_at(x: f64, z: f64) -> StampDetected {
        StampDetected {
            side: Side::Left,
            position: Position::new(x, 1.0, z),
            timestamp: 0,
        }
    }

    fn calibrated_pair() -> ItemSelector {
        let mut selector = ItemSelector::new(2);
        selector.on_stamp(&stamp_at(-1.0, 2.0));
        selector.on_stamp(&stamp_at(1.0, 2.0));
        selector
    }

    #[test]
    fn test_calibration_sequence() {
        let mut selector = ItemSelector::new(2);
        assert_eq!(selector.calibrating(), Some(0));

        let events = selector.on_stamp(&stamp_at(-1.0, 2.0));
        assert!(matches!(
            events.as_slice(),
            [SelectionEvent::ItemCalibrated { index: 0, next: Some(1), .. }]
        ));

        let events = selector.on_stamp(&stamp_at(1.0, 2.0));
        assert!(matches!(
            events.as_slice(),
            [SelectionEvent::ItemCalibrated { index: 1, next: None, .. }, SelectionEvent::Calibrated]
        ));
        assert!(selector.is_calibrated());
        assert_eq!(selector.item_position(1), Some(Position::new(1.0, 1.0, 2.0)));
    }

    #[test]
    fn test_spine_ignored_before_calibration() {
        let mut selector = ItemSelector::new(2);
        assert_eq!(selector.on_spine(&Position::new(0.0, 1.0, 2.0)), None);
    }

    #[test]
    fn test_hover_follows_nearest() {
        let mut selector = calibrated_pair();

        assert_eq!(
            selector.on_spine(&Position::new(-0.8, 1.0, 2.1)),
            Some(SelectionEvent::Hovered { index: 0, previous: None })
        );
        // Still nearest to item 0: no new event
        assert_eq!(selector.on_spine(&Position::new(-0.5, 1.0, 2.0)), None);
        assert_eq!(
            selector.on_spine(&Position::new(0.9, 1.0, 2.0)),
            Some(SelectionEvent::Hovered { index: 1, previous: Some(0) })
        );
    }

    #[test]
    fn test_stamp_selects_hovered_once() {
        let mut selector = calibrated_pair();

        // Nothing hovered yet
        assert!(selector.on_stamp(&stamp_at(0.0, 0.0)).is_empty());

        selector.on_spine(&Position::new(1.0, 1.0, 2.0));
        assert_eq!(
            selector.on_stamp(&stamp_at(1.0, 2.0)),
            vec![SelectionEvent::Selected { index: 1, previous: None }]
        );
        assert!(selector.on_stamp(&stamp_at(1.0, 2.0)).is_empty());

        selector.on_spine(&Position::new(-1.0, 1.0, 2.0));
        assert_eq!(
            selector.on_stamp(&stamp_at(-1.0, 2.0)),
            vec![SelectionEvent::Selected { index: 0, previous: Some(1) }]
        );
        assert_eq!(selector.selected(), Some(0));
    }

    #[test]
    fn test_recalibrate_resets() {
        let mut selector = calibrated_pair();
        selector.on_spine(&Position::new(1.0, 1.0, 2.0));
        selector.recalibrate();
        assert_eq!(selector.calibrating(), Some(0));
        assert_eq!(selector.hovered(), None);
    }
}
