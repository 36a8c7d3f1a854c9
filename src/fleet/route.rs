use crate::geo::GeoPoint;
use crate::network::Waypoint;

/// Result of advancing along a route for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    /// Still between waypoints; carries the interpolated position.
    Partial(GeoPoint),
    /// Reached the next waypoint, which is now the current one.
    HopCompleted(Waypoint),
}

/// A vehicle's planned path and its progress along it.
///
/// The cursor sits between `waypoints[index]` and `waypoints[index + 1]`,
/// `progress` of the way along. A route with fewer than two waypoints, or whose
/// cursor has reached the last waypoint, is exhausted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteTracker {
    waypoints: Vec<Waypoint>,
    index: usize,
    progress: f64,
}

impl RouteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the route and rewinds the cursor to the first waypoint.
    pub fn set(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = waypoints;
        self.index = 0;
        self.progress = 0.0;
    }

    pub fn clear(&mut self) {
        self.set(Vec::new());
    }

    pub fn is_exhausted(&self) -> bool {
        self.index + 1 >= self.waypoints.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn current(&self) -> Option<Waypoint> {
        self.waypoints.get(self.index).copied()
    }

    pub fn next(&self) -> Option<Waypoint> {
        self.waypoints.get(self.index + 1).copied()
    }

    /// Waypoints from the current one to the end.
    pub fn remaining(&self) -> &[Waypoint] {
        self.waypoints.get(self.index..).unwrap_or(&[])
    }

    /// Moves `increment` of a hop forward.
    ///
    /// Progress is quantized per tick; it does not depend on hop length. When
    /// progress reaches 1.0 the cursor advances and progress resets to zero.
    /// Returns `None` if the route is exhausted.
    pub fn advance(&mut self, increment: f64) -> Option<Advance> {
        let current = self.current()?;
        let next = self.next()?;

        self.progress += increment;
        if self.progress >= 1.0 {
            self.index += 1;
            self.progress = 0.0;
            Some(Advance::HopCompleted(next))
        } else {
            Some(Advance::Partial(
                current.position.lerp(next.position, self.progress),
            ))
        }
    }
}
