//! Skeleton-space geometry
//!
//! Positions are in the sensor's camera space (meters): x to the sensor's
//! left, y up, z away from the sensor.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Coordinate axis selector for extremum lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coordinate {
    X,
    /// Height above the floor plane
    Y,
    /// Depth (distance from the sensor)
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, coord: Coordinate) -> f64 {
        match coord {
            Coordinate::X => self.x,
            Coordinate::Y => self.y,
            Coordinate::Z => self.z,
        }
    }

    pub fn height(&self) -> f64 {
        self.y
    }

    pub fn depth(&self) -> f64 {
        self.z
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        Vector3::from(*self).metric_distance(&Vector3::from(*other))
    }
}

impl From<Position> for Vector3<f64> {
    fn from(p: Position) -> Self {
        Vector3::new(p.x, p.y, p.z)
    }
}

impl From<Vector3<f64>> for Position {
    fn from(v: Vector3<f64>) -> Self {
        Position::new(v.x, v.y, v.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coordinate_access() {
        let p = Position::new(1.0, 2.0, 3.0);
        assert_eq!(p.get(Coordinate::X), 1.0);
        assert_eq!(p.get(Coordinate::Y), p.height());
        assert_eq!(p.get(Coordinate::Z), p.depth());
    }

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert_relative_eq!(a.distance_to(&b), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_detected() {
        assert!(Position::new(0.0, 1.0, 2.0).is_finite());
        assert!(!Position::new(f64::NAN, 1.0, 2.0).is_finite());
        assert!(!Position::new(0.0, f64::INFINITY, 2.0).is_finite());
    }
}
